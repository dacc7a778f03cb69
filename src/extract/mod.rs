//! Spreadsheet -> canonical data extraction.
//!
//! Sheets are read with one of two layout strategies, merged into one
//! category tree and checked for integrity. Bad data never aborts the run:
//! each problem is a diagnostic and the smallest enclosing unit is skipped.

mod ammo;
mod block;
mod columns;
mod exceptions;
mod layout;
mod ranges;

pub use ammo::extract_ammo_stats;
pub use block::{extract_weapon_block, WeaponBlock};
pub use columns::{Column, ColumnMap};
pub use exceptions::{AmmoSplit, AmmoVariant, ExceptionTable, SynthesizedStat};
pub use layout::{Layout, MergedHeaderLayout, SheetLayout, TabColorLayout};
pub use ranges::{scan_ranges, RangeScan};

use crate::config::LayoutChoice;
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::model::{CategoryTree, WeaponCategory};
use crate::sheet::{Sheet, Workbook};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub layout: LayoutChoice,
    pub exceptions: ExceptionTable,
}

/// Categories found on one sheet, before merging.
#[derive(Debug, Clone, Default)]
pub struct SheetExtraction {
    pub categories: Vec<WeaponCategory>,
    pub diagnostics: DiagnosticLog,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tree: CategoryTree,
    pub diagnostics: DiagnosticLog,
}

/// Where a diagnostic came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Site<'a> {
    pub sheet: &'a str,
    pub weapon: Option<&'a str>,
}

impl Site<'_> {
    pub fn report(&self, log: &mut DiagnosticLog, d: Diagnostic) {
        let mut d = d.in_sheet(self.sheet);
        if let Some(w) = self.weapon {
            d = d.in_weapon(w);
        }
        log.push(d);
    }
}

/// Extract one sheet with the layout its metadata (or `options.layout`) selects.
pub fn extract_sheet(sheet: &Sheet, options: &ExtractOptions) -> SheetExtraction {
    let mut diagnostics = DiagnosticLog::default();
    let categories = match Layout::resolve(options.layout, sheet) {
        Some(layout) => {
            let strategy = layout.strategy();
            tracing::debug!("sheet {:?}: {} layout", sheet.name, strategy.name());
            strategy.extract(sheet, &options.exceptions, &mut diagnostics)
        }
        None => {
            Site {
                sheet: &sheet.name,
                weapon: None,
            }
            .report(&mut diagnostics, Diagnostic::unknown_layout());
            Vec::new()
        }
    };
    SheetExtraction {
        categories,
        diagnostics,
    }
}

/// Extract every sheet and assemble the category tree.
pub fn extract_workbook(workbook: &Workbook, options: &ExtractOptions) -> Extraction {
    let mut diagnostics = DiagnosticLog::default();
    let mut parts = Vec::with_capacity(workbook.sheets.len());
    for sheet in &workbook.sheets {
        let extracted = extract_sheet(sheet, options);
        diagnostics.extend(extracted.diagnostics);
        parts.push((sheet.name.as_str(), extracted.categories));
    }
    let tree = assemble(parts, &mut diagnostics);
    verify_integrity(&tree, &mut diagnostics);
    tracing::info!(
        "extracted {} weapon(s), {} configuration(s) in {} categor(ies); {} diagnostic(s)",
        tree.weapon_count(),
        tree.stat_count(),
        tree.categories.len(),
        diagnostics.len()
    );
    Extraction { tree, diagnostics }
}

/// Merge per-sheet categories by name in first-seen order. A weapon name seen
/// twice keeps its first block.
pub fn assemble<'a>(
    parts: impl IntoIterator<Item = (&'a str, Vec<WeaponCategory>)>,
    log: &mut DiagnosticLog,
) -> CategoryTree {
    let mut tree = CategoryTree::default();
    let mut names = HashSet::new();
    for (sheet, categories) in parts {
        for category in categories {
            let idx = match tree.categories.iter().position(|c| c.name == category.name) {
                Some(i) => i,
                None => {
                    tree.categories.push(WeaponCategory {
                        name: category.name.clone(),
                        weapons: Vec::new(),
                    });
                    tree.categories.len() - 1
                }
            };
            for weapon in category.weapons {
                if !names.insert(weapon.name.clone()) {
                    log.push(Diagnostic::duplicate_weapon(&weapon.name).in_sheet(sheet));
                    continue;
                }
                tree.categories[idx].weapons.push(weapon);
            }
        }
    }
    tree
}

/// Post-assembly checks: every configuration's ammo has ammo stats, and no weapon is empty.
pub fn verify_integrity(tree: &CategoryTree, log: &mut DiagnosticLog) {
    for weapon in tree.weapons() {
        if weapon.stats.is_empty() {
            log.push(Diagnostic::empty_weapon().in_weapon(&weapon.name));
            continue;
        }
        let missing: BTreeSet<&str> = weapon
            .stats
            .iter()
            .map(|s| s.ammo_type.as_str())
            .filter(|a| !weapon.ammo_stats.contains_key(*a))
            .collect();
        for ammo in missing {
            log.push(Diagnostic::missing_ammo_stats(ammo).in_weapon(&weapon.name));
        }
    }
}
