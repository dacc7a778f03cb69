//! Capacity rows: magazine, reload and headshot stats per ammo type.

use super::columns::{HEADSHOT_OFFSET, MAGAZINE_OFFSET, PELLET_OFFSET, RELOAD_OFFSET};
use super::exceptions::ExceptionTable;
use crate::classify::{
    canonical_ammo_stat_name, is_shotgun_ammo, parse_leading_float, parse_leading_int,
    parse_reload,
};
use crate::model::AmmoStat;
use crate::sheet::Sheet;

const PLACEHOLDERS: &[&str] = &["x", "CellImage"];

/// True when the capacity ammo-name cell at `col` holds an ammo name.
pub fn is_capacity_row(sheet: &Sheet, row: usize, col: usize) -> bool {
    let text = sheet.text(row, col);
    !text.is_empty()
        && !PLACEHOLDERS.contains(&text.as_str())
        && !super::columns::Column::AmmoType.matches(&text)
}

/// Read one capacity row whose ammo name sits in `col`.
///
/// Shotgun ammo has a pellet-count cell right after the name, which pushes
/// every following cell one column to the right.
pub fn extract_ammo_stats(
    sheet: &Sheet,
    row: usize,
    col: usize,
    weapon: &str,
    exceptions: &ExceptionTable,
) -> Vec<(String, AmmoStat)> {
    let name = canonical_ammo_stat_name(&sheet.text(row, col));
    let shotty_offset = usize::from(is_shotgun_ammo(&name));
    let read_int = |offset: usize| {
        parse_leading_int(&sheet.text(row, col + offset)).and_then(|n| u32::try_from(n).ok())
    };

    let pellet_count = if shotty_offset == 1 {
        read_int(PELLET_OFFSET)
    } else {
        None
    };
    let mag_size = read_int(MAGAZINE_OFFSET + shotty_offset);
    let (empty_reload, tactical_reload) =
        parse_reload(&sheet.text(row, col + RELOAD_OFFSET + shotty_offset));
    let headshot_multiplier =
        parse_leading_float(&sheet.text(row, col + HEADSHOT_OFFSET + shotty_offset));

    let stat = AmmoStat {
        mag_size,
        empty_reload,
        tactical_reload,
        headshot_multiplier,
        pellet_count,
    };
    exceptions.split_ammo_stat(weapon, &name, stat)
}
