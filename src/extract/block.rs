//! Weapon block extractor: walks a block's rows top to bottom tracking the
//! current barrel and ammo types, and emits one configuration per (barrel, ammo).

use super::ammo::{extract_ammo_stats, is_capacity_row};
use super::columns::{Column, ColumnMap};
use super::exceptions::ExceptionTable;
use super::ranges::RangeScan;
use super::Site;
use crate::classify::{
    classify_ammo_type, classify_barrel_type, parse_leading_float, parse_leading_int,
};
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::model::{DamageRange, Weapon, WeaponConfigurationStat};
use crate::sheet::Sheet;
use std::collections::HashSet;
use std::ops::Range;

const AMMO_PLACEHOLDERS: &[&str] = &["x", "CellImage"];
const BARREL_PLACEHOLDERS: &[&str] = &["Comparison Tool", "Barrel (Damage Modifier)"];

/// One weapon's rows and how to read them.
pub struct WeaponBlock<'a> {
    pub sheet: &'a Sheet,
    pub weapon: &'a str,
    /// Data rows, header excluded.
    pub rows: Range<usize>,
    pub columns: &'a ColumnMap,
    pub scan: &'a RangeScan,
}

#[derive(Default)]
struct BlockState {
    ammo_types: Vec<String>,
    barrel_type: Option<&'static str>,
    seen: HashSet<(String, String)>,
}

/// Extract one weapon. Bad cells are reported to `log` and skipped.
pub fn extract_weapon_block(
    block: &WeaponBlock<'_>,
    exceptions: &ExceptionTable,
    log: &mut DiagnosticLog,
) -> Weapon {
    let site = Site {
        sheet: &block.sheet.name,
        weapon: Some(block.weapon),
    };
    let sheet = block.sheet;
    let cols = block.columns;
    let mut weapon = Weapon::new(block.weapon);
    let mut state = BlockState::default();

    for row in block.rows.clone() {
        if block.scan.is_stopped(row) {
            break;
        }

        let ammo_text = sheet.text(row, cols.ammo);
        if !ammo_text.is_empty()
            && !AMMO_PLACEHOLDERS.contains(&ammo_text.as_str())
            && !Column::Ammo.matches(&ammo_text)
        {
            let classified = classify_ammo_type(&ammo_text);
            for code in &classified.unresolved {
                site.report(log, Diagnostic::unknown_ammo_code(code).at_row(row));
            }
            state.ammo_types = classified.names;
        }

        let barrel_text = sheet.text(row, cols.barrel);
        if !barrel_text.is_empty() && !BARREL_PLACEHOLDERS.contains(&barrel_text.as_str()) {
            state.barrel_type = classify_barrel_type(&barrel_text);
            if state.barrel_type.is_none() {
                site.report(log, Diagnostic::unknown_barrel(&barrel_text).at_row(row));
            }
        }

        if is_capacity_row(sheet, row, cols.capacity_ammo) {
            for (name, stat) in
                extract_ammo_stats(sheet, row, cols.capacity_ammo, block.weapon, exceptions)
            {
                weapon.ammo_stats.entry(name).or_insert(stat);
            }
        }

        let Some(barrel) = state.barrel_type else {
            continue;
        };
        if state.ammo_types.is_empty() {
            continue;
        }
        let Some(end) = block.scan.span_at(row, &sheet.text(row, cols.range)) else {
            continue;
        };
        let last = end.min(block.rows.end.saturating_sub(1));
        for ammo in state.ammo_types.clone() {
            if !state.seen.insert((barrel.to_string(), ammo.clone())) {
                site.report(
                    log,
                    Diagnostic::duplicate_configuration(barrel, &ammo).at_row(row),
                );
                continue;
            }
            let stat = read_configuration(block, barrel, &ammo, row, last, &site, log);
            weapon.stats.push(stat);
        }
    }

    for (barrel, ammo) in exceptions.synthesize_missing(&mut weapon) {
        site.report(log, Diagnostic::synthesized(&barrel, &ammo));
    }
    for ammo in drop_orphan_ammo_stats(&mut weapon) {
        site.report(log, Diagnostic::orphan_ammo_stats(&ammo));
    }
    weapon
}

/// Ammo stats are only kept for ammo types some configuration uses.
/// Returns the names removed.
fn drop_orphan_ammo_stats(weapon: &mut Weapon) -> Vec<String> {
    let used: HashSet<String> = weapon.stats.iter().map(|s| s.ammo_type.clone()).collect();
    let mut dropped = Vec::new();
    weapon.ammo_stats.retain(|name, _| {
        let keep = used.contains(name);
        if !keep {
            dropped.push(name.clone());
        }
        keep
    });
    dropped
}

/// Build one configuration from the dropoff table spanning `first..=last`.
fn read_configuration(
    block: &WeaponBlock<'_>,
    barrel: &str,
    ammo: &str,
    first: usize,
    last: usize,
    site: &Site<'_>,
    log: &mut DiagnosticLog,
) -> WeaponConfigurationStat {
    let sheet = block.sheet;
    let cols = block.columns;
    let mut stat = WeaponConfigurationStat::new(barrel, ammo);

    let span = || (first..=last).filter(|r| !block.scan.is_stopped(*r));
    // Figures may sit on any row of a merged span; take the first filled one.
    let read_int = |col: Option<usize>| {
        let col = col?;
        span()
            .find_map(|r| parse_leading_int(&sheet.text(r, col)))
            .and_then(|n| u32::try_from(n).ok())
    };
    stat.velocity = read_int(cols.velocity);
    stat.rpm_single = read_int(cols.rpm_single);
    stat.rpm_burst = read_int(cols.rpm_burst);
    stat.rpm_auto = read_int(cols.rpm_auto);

    for r in span() {
        let damage = parse_leading_float(&sheet.text(r, cols.damage));
        let range = parse_leading_float(&sheet.text(r, cols.range));
        let (Some(damage), Some(range)) = (damage, range) else {
            continue;
        };
        if let Some(prev) = stat.dropoffs.last() {
            if range <= prev.range {
                site.report(
                    log,
                    Diagnostic::non_increasing_range(range, prev.range).at_row(r),
                );
                continue;
            }
        }
        stat.dropoffs.push(DamageRange { damage, range });
    }
    stat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ranges::scan_ranges;
    use crate::sheet::{Cell, MergedRange};

    fn t(s: &str) -> Cell {
        if s.is_empty() {
            Cell::empty()
        } else {
            Cell::text(s)
        }
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
        rows.iter().map(|r| r.iter().map(|c| t(c)).collect()).collect()
    }

    fn run(sheet: &Sheet, weapon: &str) -> (Weapon, DiagnosticLog) {
        let columns = ColumnMap::fixed();
        let scan = scan_ranges(&sheet.merges, columns.ammo, 0);
        let block = WeaponBlock {
            sheet,
            weapon,
            rows: 1..sheet.row_count(),
            columns: &columns,
            scan: &scan,
        };
        let mut log = DiagnosticLog::default();
        let w = extract_weapon_block(&block, &ExceptionTable::default(), &mut log);
        (w, log)
    }

    const HEADER: &[&str] = &[
        "Barrel (Damage Modifier)",
        "Ammo",
        "Damage",
        "Range",
        "Velocity",
        "RPM (Single)",
        "RPM (Burst)",
        "RPM (Auto)",
        "",
        "Ammo Type",
    ];

    #[test]
    fn emits_one_configuration_per_barrel_and_ammo() {
        let rows = grid(&[
            HEADER,
            &["Factory", "ST|CC", "25", "0 ~", "600", "", "", "720", "", "Standard", "30", "2.8s (empty) / 2.1s (tactical)", "1.34x"],
            &["", "", "20", "30 ~", "", "", "", "", "", "Close Combat", "30", "2.8s (empty)", "1.5x"],
            &["", "", "18", "60 ~", "", "", "", "", "", "", "", "", ""],
            &["Extended", "ST", "25", "0 ~", "650", "", "", "720", "", "", "", "", ""],
            &["", "", "22", "45 ~", "", "", "", "", "", "", "", "", ""],
        ]);
        let sheet = Sheet::new("M5A3", rows).with_merges(vec![
            MergedRange::new(1, 3, 1, 1),
            MergedRange::new(4, 5, 1, 1),
        ]);
        let (w, log) = run(&sheet, "M5A3");
        assert!(log.is_empty(), "{:?}", log.entries);
        let keys: Vec<_> = w
            .stats
            .iter()
            .map(|s| (s.barrel_type.as_str(), s.ammo_type.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Factory", "Standard"),
                ("Factory", "Close Combat"),
                ("Extended", "Standard")
            ]
        );
        let f = &w.stats[0];
        assert_eq!(f.rpm_auto, Some(720));
        assert_eq!(f.velocity, Some(600));
        assert_eq!(f.rpm_single, None);
        let ranges: Vec<f64> = f.dropoffs.iter().map(|d| d.range).collect();
        assert_eq!(ranges, vec![0.0, 30.0, 60.0]);
        assert_eq!(w.stats[2].dropoffs.len(), 2);
        assert_eq!(w.ammo_stats["Standard"].mag_size, Some(30));
        assert_eq!(w.ammo_stats["Close Combat"].headshot_multiplier, Some(1.5));
    }

    #[test]
    fn duplicate_configuration_keeps_first() {
        let rows = grid(&[
            HEADER,
            &["Factory", "ST", "25", "0 ~"],
            &["Factory", "ST", "99", "0 ~"],
        ]);
        let sheet = Sheet::new("M5A3", rows);
        let (w, log) = run(&sheet, "M5A3");
        assert_eq!(w.stats.len(), 1);
        assert_eq!(w.stats[0].dropoffs[0].damage, 25.0);
        assert_eq!(log.with_code("DUPLICATE_CONFIGURATION").count(), 1);
    }

    #[test]
    fn unknown_barrel_skips_rows_until_next_barrel() {
        let rows = grid(&[
            HEADER,
            &["Mystery Tube", "ST", "25", "0 ~"],
            &["Factory", "ST", "24", "0 ~"],
        ]);
        let sheet = Sheet::new("M5A3", rows);
        let (w, log) = run(&sheet, "M5A3");
        assert_eq!(w.stats.len(), 1);
        assert_eq!(w.stats[0].dropoffs[0].damage, 24.0);
        assert_eq!(log.with_code("UNKNOWN_BARREL").count(), 1);
    }

    #[test]
    fn unknown_ammo_code_is_reported_and_placeholders_ignored() {
        let rows = grid(&[
            HEADER,
            &["Comparison Tool", "x"],
            &["Factory", "ZZ|ST", "25", "0 ~"],
            &["", "My two cents: bad", "", ""],
        ]);
        let sheet = Sheet::new("M5A3", rows);
        let (w, log) = run(&sheet, "M5A3");
        assert_eq!(w.stats.len(), 1);
        assert_eq!(w.stats[0].ammo_type, "Standard");
        assert_eq!(log.with_code("UNKNOWN_AMMO_CODE").count(), 1);
    }

    #[test]
    fn patch_divider_stops_the_block() {
        let mut rows = grid(&[
            HEADER,
            &["Factory", "ST", "25", "0 ~"],
            &["Patch 1.0"],
            &["Factory", "CC", "30", "0 ~"],
        ]);
        rows[2].resize(22, Cell::empty());
        let sheet = Sheet::new("M5A3", rows).with_merges(vec![MergedRange::new(2, 2, 0, 21)]);
        let (w, _) = run(&sheet, "M5A3");
        assert_eq!(w.stats.len(), 1);
        assert_eq!(w.stats[0].ammo_type, "Standard");
    }

    #[test]
    fn non_increasing_ranges_are_dropped() {
        let rows = grid(&[
            HEADER,
            &["Factory", "ST", "25", "0 ~"],
            &["", "", "20", "30 ~"],
            &["", "", "19", "30 ~"],
        ]);
        let sheet = Sheet::new("M5A3", rows).with_merges(vec![MergedRange::new(1, 3, 1, 1)]);
        let (w, log) = run(&sheet, "M5A3");
        assert_eq!(w.stats[0].dropoffs.len(), 2);
        assert_eq!(log.with_code("NON_INCREASING_RANGE").count(), 1);
    }

    #[test]
    fn ghostmaker_without_explosive_bolt_row_gets_one() {
        let rows = grid(&[HEADER, &["Factory", "TB", "100", "0 ~"]]);
        let sheet = Sheet::new("GHOSTMAKER R10", rows);
        let (w, log) = run(&sheet, "GHOSTMAKER R10");
        let s = w.stat("Factory", "Explosive Bolt").unwrap();
        assert_eq!(
            s.dropoffs,
            vec![DamageRange {
                damage: 132.5,
                range: 0.0
            }]
        );
        assert_eq!(log.with_code("SYNTHESIZED_CONFIGURATION").count(), 1);
    }

    #[test]
    fn capacity_rows_without_configuration_are_dropped() {
        let rows = grid(&[
            HEADER,
            &["Factory", "ST", "25", "0 ~", "", "", "", "600", "", "Standard", "30"],
            &["", "", "", "", "", "", "", "", "", "High Power", "20"],
        ]);
        let sheet = Sheet::new("M5A3", rows);
        let (w, log) = run(&sheet, "M5A3");
        let keys: Vec<_> = w.ammo_stats.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Standard"]);
        let orphans: Vec<_> = log.with_code("ORPHAN_AMMO_STATS").collect();
        assert_eq!(orphans.len(), 1);
        assert!(orphans[0].message.contains("High Power"));
        assert_eq!(orphans[0].weapon.as_deref(), Some("M5A3"));
    }

    #[test]
    fn rorsch_split_keeps_only_extracted_fire_modes() {
        let rows = grid(&[
            HEADER,
            &["Factory", "RR (SF)", "40", "0 ~", "", "60", "", "", "", "Rorsch Round", "10", "3.0s (empty)", "2x"],
        ]);
        let sheet = Sheet::new("RORSCH MK-4", rows);
        let (w, log) = run(&sheet, "RORSCH MK-4");
        let keys: Vec<_> = w.ammo_stats.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Rorsch Round (Single)"]);
        assert_eq!(log.with_code("ORPHAN_AMMO_STATS").count(), 1);
    }

    #[test]
    fn rorsch_capacity_row_is_split() {
        let rows = grid(&[
            HEADER,
            &["Factory", "RR (BF/FA)|RR (SF)", "40", "0 ~", "", "60", "", "400", "", "Rorsch Round", "10", "3.0s (empty)", "2x"],
        ]);
        let sheet = Sheet::new("RORSCH MK-4", rows);
        let (w, _) = run(&sheet, "RORSCH MK-4");
        assert!(w.ammo_stats.get("Rorsch Round").is_none());
        assert_eq!(
            w.ammo_stats["Rorsch Round (Burst/Auto)"].headshot_multiplier,
            Some(1.9)
        );
        assert_eq!(w.ammo_stats["Rorsch Round (Single)"].headshot_multiplier, Some(3.0));
        for s in &w.stats {
            assert!(w.ammo_stats.contains_key(&s.ammo_type), "{}", s.ammo_type);
        }
    }
}
