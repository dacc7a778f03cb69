//! Sheet layouts. The maintainer has published two: one tab per weapon with the
//! category in the tab color, and one sheet holding every weapon under merged
//! category headers. Both produce the same categories.

use super::block::{extract_weapon_block, WeaponBlock};
use super::columns::ColumnMap;
use super::exceptions::ExceptionTable;
use super::ranges::scan_ranges;
use super::Site;
use crate::classify::{classify_category, TabCategory};
use crate::config::{LayoutChoice, PATCH_DIVIDER_MIN_COLUMNS};
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::model::WeaponCategory;
use crate::sheet::{MergedRange, Sheet};

/// Row holding the merged category headers in the merged-header layout.
const CATEGORY_HEADER_ROW: usize = 0;

/// Backgrounds that mark a weapon-name cell in the merged-header layout.
const WEAPON_NAME_BACKGROUNDS: &[&str] = &["#000000", "#222222", "#434343", "#666666"];

const NAME_PLACEHOLDERS: &[&str] = &["x", "CellImage"];

pub trait SheetLayout {
    fn name(&self) -> &'static str;

    fn extract(
        &self,
        sheet: &Sheet,
        exceptions: &ExceptionTable,
        log: &mut DiagnosticLog,
    ) -> Vec<WeaponCategory>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    TabColor,
    MergedHeader,
}

impl Layout {
    /// Pick a layout from the metadata the sheet carries.
    pub fn detect(sheet: &Sheet) -> Option<Layout> {
        if sheet.tab_color.is_some() {
            Some(Layout::TabColor)
        } else if !category_headers(sheet).is_empty() {
            Some(Layout::MergedHeader)
        } else {
            None
        }
    }

    pub fn resolve(choice: LayoutChoice, sheet: &Sheet) -> Option<Layout> {
        match choice {
            LayoutChoice::Auto => Self::detect(sheet),
            LayoutChoice::TabColor => Some(Layout::TabColor),
            LayoutChoice::MergedHeader => Some(Layout::MergedHeader),
        }
    }

    pub fn strategy(self) -> &'static dyn SheetLayout {
        match self {
            Layout::TabColor => &TabColorLayout,
            Layout::MergedHeader => &MergedHeaderLayout,
        }
    }
}

/// One sheet per weapon; the tab color names the category.
pub struct TabColorLayout;

impl SheetLayout for TabColorLayout {
    fn name(&self) -> &'static str {
        "tab-color"
    }

    fn extract(
        &self,
        sheet: &Sheet,
        exceptions: &ExceptionTable,
        log: &mut DiagnosticLog,
    ) -> Vec<WeaponCategory> {
        let site = Site {
            sheet: &sheet.name,
            weapon: None,
        };
        let Some(color) = sheet.tab_color.as_deref() else {
            site.report(log, Diagnostic::unknown_layout());
            return Vec::new();
        };
        let category = match classify_category(color) {
            TabCategory::Category(name) => name,
            TabCategory::Ignore => {
                tracing::debug!("sheet {:?} ignored by tab color", sheet.name);
                return Vec::new();
            }
            TabCategory::Unknown => {
                site.report(log, Diagnostic::unknown_tab_color(color));
                return Vec::new();
            }
        };
        let weapon_name = sheet.name.trim();
        if weapon_name.is_empty() {
            site.report(log, Diagnostic::missing_weapon_name());
            return Vec::new();
        }

        let columns = ColumnMap::fixed();
        let first_row = match columns.find_header_row(sheet) {
            Some(header) => {
                for d in columns.check_header_row(sheet, header) {
                    site.report(log, d);
                }
                header + 1
            }
            None => {
                site.report(
                    log,
                    Diagnostic::header_mismatch(
                        super::columns::Column::Barrel.label(),
                        "(no header row)",
                    ),
                );
                0
            }
        };
        let scan = scan_ranges(&sheet.merges, columns.ammo, first_row);
        let block = WeaponBlock {
            sheet,
            weapon: weapon_name,
            rows: first_row..sheet.row_count(),
            columns: &columns,
            scan: &scan,
        };
        let weapon = extract_weapon_block(&block, exceptions, log);
        vec![WeaponCategory {
            name: category.to_string(),
            weapons: vec![weapon],
        }]
    }
}

/// All weapons on one sheet; merged headers on the first row name the categories
/// and dark name cells start each weapon.
pub struct MergedHeaderLayout;

impl SheetLayout for MergedHeaderLayout {
    fn name(&self) -> &'static str {
        "merged-header"
    }

    fn extract(
        &self,
        sheet: &Sheet,
        exceptions: &ExceptionTable,
        log: &mut DiagnosticLog,
    ) -> Vec<WeaponCategory> {
        let headers = category_headers(sheet);
        if headers.is_empty() {
            Site {
                sheet: &sheet.name,
                weapon: None,
            }
            .report(log, Diagnostic::unknown_layout());
            return Vec::new();
        }
        let sheet_stop = patch_divider_row(&sheet.merges, CATEGORY_HEADER_ROW)
            .unwrap_or(sheet.row_count());

        let mut out = Vec::new();
        for header in headers {
            let name = sheet.text(header.start_row, header.start_col);
            let starts: Vec<usize> = (CATEGORY_HEADER_ROW + 1..sheet_stop)
                .filter(|&r| is_weapon_start(sheet, r, header.start_col))
                .collect();
            let mut weapons = Vec::new();
            for (i, &start) in starts.iter().enumerate() {
                let end = starts.get(i + 1).copied().unwrap_or(sheet_stop);
                let weapon_name = sheet.text(start, header.start_col);
                let site = Site {
                    sheet: &sheet.name,
                    weapon: Some(weapon_name.as_str()),
                };
                let header_row = start + 1;
                let columns = match ColumnMap::from_header_row(
                    sheet,
                    header_row,
                    header.start_col..=header.end_col,
                ) {
                    Ok(c) => c,
                    Err(d) => {
                        site.report(log, d);
                        continue;
                    }
                };
                let scan = scan_ranges(&sheet.merges, columns.ammo, header_row);
                let block = WeaponBlock {
                    sheet,
                    weapon: &weapon_name,
                    rows: (header_row + 1)..end,
                    columns: &columns,
                    scan: &scan,
                };
                weapons.push(extract_weapon_block(&block, exceptions, log));
            }
            if weapons.is_empty() {
                tracing::debug!("category {:?} on sheet {:?} has no weapons", name, sheet.name);
                continue;
            }
            out.push(WeaponCategory { name, weapons });
        }
        out
    }
}

/// Merges on the category header row that carry text, left to right.
fn category_headers(sheet: &Sheet) -> Vec<MergedRange> {
    let mut headers: Vec<MergedRange> = sheet
        .merges
        .iter()
        .filter(|m| {
            m.start_row == CATEGORY_HEADER_ROW
                && m.width() < PATCH_DIVIDER_MIN_COLUMNS
                && !sheet.text(m.start_row, m.start_col).is_empty()
        })
        .copied()
        .collect();
    headers.sort_by_key(|m| m.start_col);
    headers
}

fn patch_divider_row(merges: &[MergedRange], after: usize) -> Option<usize> {
    merges
        .iter()
        .filter(|m| m.width() >= PATCH_DIVIDER_MIN_COLUMNS && m.start_row > after)
        .map(|m| m.start_row)
        .min()
}

fn is_weapon_start(sheet: &Sheet, row: usize, col: usize) -> bool {
    let dark = sheet
        .background(row, col)
        .map(|bg| WEAPON_NAME_BACKGROUNDS.contains(&bg))
        .unwrap_or(false);
    if !dark {
        return false;
    }
    let text = sheet.text(row, col);
    !text.is_empty() && !NAME_PLACEHOLDERS.contains(&text.as_str())
}
