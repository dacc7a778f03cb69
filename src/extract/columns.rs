//! Column layout of a weapon block: where barrel, ammo, dropoff and capacity cells live.

use crate::diagnostics::Diagnostic;
use crate::sheet::Sheet;
use std::ops::RangeInclusive;

/// Capacity cells relative to the capacity ammo-name column, before the shotgun offset.
pub const PELLET_OFFSET: usize = 1;
pub const MAGAZINE_OFFSET: usize = 1;
pub const RELOAD_OFFSET: usize = 2;
pub const HEADSHOT_OFFSET: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Barrel,
    Ammo,
    Damage,
    Range,
    Velocity,
    RpmSingle,
    RpmBurst,
    RpmAuto,
    AmmoType,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Barrel,
        Column::Ammo,
        Column::Damage,
        Column::Range,
        Column::Velocity,
        Column::RpmSingle,
        Column::RpmBurst,
        Column::RpmAuto,
        Column::AmmoType,
    ];

    /// Header text as the sheet maintainer writes it.
    pub fn label(self) -> &'static str {
        match self {
            Column::Barrel => "Barrel (Damage Modifier)",
            Column::Ammo => "Ammo",
            Column::Damage => "Damage",
            Column::Range => "Range",
            Column::Velocity => "Velocity",
            Column::RpmSingle => "RPM (Single)",
            Column::RpmBurst => "RPM (Burst)",
            Column::RpmAuto => "RPM (Auto)",
            Column::AmmoType => "Ammo Type",
        }
    }

    pub fn required(self) -> bool {
        matches!(
            self,
            Column::Barrel | Column::Ammo | Column::Damage | Column::Range | Column::AmmoType
        )
    }

    /// Loose header match: case-insensitive, tolerant of units and modifiers in parentheses.
    pub fn matches(self, header: &str) -> bool {
        let h = header.trim().to_lowercase();
        match self {
            Column::Barrel => h.starts_with("barrel"),
            Column::Ammo => h == "ammo",
            Column::Damage => h.starts_with("damage"),
            Column::Range => h.starts_with("range"),
            Column::Velocity => h.contains("velocity"),
            Column::RpmSingle => h.contains("rpm") && h.contains("single"),
            Column::RpmBurst => h.contains("rpm") && h.contains("burst"),
            Column::RpmAuto => h.contains("rpm") && h.contains("auto"),
            Column::AmmoType => h == "ammo type",
        }
    }
}

/// Absolute column indices for one weapon block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub barrel: usize,
    pub ammo: usize,
    pub damage: usize,
    pub range: usize,
    pub velocity: Option<usize>,
    pub rpm_single: Option<usize>,
    pub rpm_burst: Option<usize>,
    pub rpm_auto: Option<usize>,
    pub capacity_ammo: usize,
}

impl ColumnMap {
    /// One-weapon-per-sheet layout.
    pub fn fixed() -> Self {
        Self {
            barrel: 0,
            ammo: 1,
            damage: 2,
            range: 3,
            velocity: Some(4),
            rpm_single: Some(5),
            rpm_burst: Some(6),
            rpm_auto: Some(7),
            capacity_ammo: 9,
        }
    }

    pub fn get(&self, column: Column) -> Option<usize> {
        match column {
            Column::Barrel => Some(self.barrel),
            Column::Ammo => Some(self.ammo),
            Column::Damage => Some(self.damage),
            Column::Range => Some(self.range),
            Column::Velocity => self.velocity,
            Column::RpmSingle => self.rpm_single,
            Column::RpmBurst => self.rpm_burst,
            Column::RpmAuto => self.rpm_auto,
            Column::AmmoType => Some(self.capacity_ammo),
        }
    }

    /// Resolve columns by scanning a header row within `cols`. The first
    /// matching cell wins. A missing required header is an error for the block.
    pub fn from_header_row(
        sheet: &Sheet,
        row: usize,
        cols: RangeInclusive<usize>,
    ) -> Result<Self, Diagnostic> {
        let find = |column: Column| {
            cols.clone()
                .find(|&c| column.matches(&sheet.text(row, c)))
        };
        let require = |column: Column| {
            find(column).ok_or_else(|| Diagnostic::missing_column(column.label()).at_row(row))
        };
        Ok(Self {
            barrel: require(Column::Barrel)?,
            ammo: require(Column::Ammo)?,
            damage: require(Column::Damage)?,
            range: require(Column::Range)?,
            velocity: find(Column::Velocity),
            rpm_single: find(Column::RpmSingle),
            rpm_burst: find(Column::RpmBurst),
            rpm_auto: find(Column::RpmAuto),
            capacity_ammo: require(Column::AmmoType)?,
        })
    }

    /// Compare a header row against this map. Returns one diagnostic per mismatching cell.
    pub fn check_header_row(&self, sheet: &Sheet, row: usize) -> Vec<Diagnostic> {
        Column::ALL
            .iter()
            .filter_map(|&column| {
                let col = self.get(column)?;
                let found = sheet.text(row, col);
                if column.matches(&found) {
                    None
                } else {
                    Some(Diagnostic::header_mismatch(column.label(), &found).at_row(row))
                }
            })
            .collect()
    }

    /// First row whose barrel cell carries the barrel header.
    pub fn find_header_row(&self, sheet: &Sheet) -> Option<usize> {
        (0..sheet.row_count()).find(|&r| Column::Barrel.matches(&sheet.text(r, self.barrel)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Cell;

    fn header_row(labels: &[&str]) -> Sheet {
        Sheet::new(
            "S",
            vec![labels.iter().map(|l| Cell::text(*l)).collect()],
        )
    }

    #[test]
    fn resolves_columns_from_headers_in_any_order() {
        let sheet = header_row(&[
            "",
            "Ammo",
            "Barrel (Damage Modifier)",
            "Range (m)",
            "Damage",
            "RPM (Auto)",
            "",
            "Ammo Type",
        ]);
        let map = ColumnMap::from_header_row(&sheet, 0, 0..=7).unwrap();
        assert_eq!(map.barrel, 2);
        assert_eq!(map.ammo, 1);
        assert_eq!(map.damage, 4);
        assert_eq!(map.range, 3);
        assert_eq!(map.rpm_auto, Some(5));
        assert_eq!(map.rpm_single, None);
        assert_eq!(map.capacity_ammo, 7);
    }

    #[test]
    fn missing_required_header_is_error() {
        let sheet = header_row(&["Barrel", "Ammo", "Damage", "Ammo Type"]);
        let err = ColumnMap::from_header_row(&sheet, 0, 0..=3).unwrap_err();
        assert_eq!(err.code, "MISSING_COLUMN");
        assert!(err.message.contains("Range"));
    }

    #[test]
    fn header_scan_stays_within_column_range() {
        let sheet = header_row(&[
            "Barrel", "Ammo", "Damage", "Range", "Ammo Type", "Barrel", "Ammo",
        ]);
        let map = ColumnMap::from_header_row(&sheet, 0, 5..=6);
        assert!(map.is_err());
    }

    #[test]
    fn fixed_layout_header_check() {
        let sheet = header_row(&[
            "Barrel (Damage Modifier)",
            "Ammo",
            "Damage",
            "Range",
            "Velocity",
            "RPM (Single)",
            "RPM (Burst)",
            "Fire rate",
            "",
            "Ammo Type",
        ]);
        let map = ColumnMap::fixed();
        assert_eq!(map.find_header_row(&sheet), Some(0));
        let mismatches = map.check_header_row(&sheet, 0);
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].message.contains("RPM (Auto)"));
    }
}
