//! Compare two extraction snapshots: weapons added or removed, and
//! configurations whose point-blank TTK moved by more than the threshold.

use crate::config::DIFF_TTK_THRESHOLD;
use crate::extract::ExceptionTable;
use crate::metrics::{damage_at_range, ttk, ConfigStats, MetricIndex, Modifiers, RpmSelector};
use crate::model::CategoryTree;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TtkDirection {
    Faster,
    Slower,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtkChange {
    pub weapon: String,
    pub barrel_type: String,
    pub ammo_type: String,
    pub before_ms: u32,
    pub after_ms: u32,
    pub direction: TtkDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDiff {
    pub added_weapons: Vec<String>,
    pub removed_weapons: Vec<String>,
    pub ttk_changes: Vec<TtkChange>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.added_weapons.is_empty() && self.removed_weapons.is_empty() && self.ttk_changes.is_empty()
    }
}

fn point_blank_ttk(c: &ConfigStats<'_>, modifiers: &Modifiers) -> Option<u32> {
    let damage = damage_at_range(&c.stat.dropoffs, 0.0)?;
    ttk(c.ammo, modifiers, damage, RpmSelector::Fastest.select(c.stat))
}

/// Changes from `before` to `after`. TTK is taken at 0 m with the fastest fire mode.
pub fn diff_trees(before: &CategoryTree, after: &CategoryTree, modifiers: &Modifiers) -> TreeDiff {
    let names = |t: &CategoryTree| -> BTreeSet<String> { t.weapons().map(|w| w.name.clone()).collect() };
    let old_names = names(before);
    let new_names = names(after);

    let old = MetricIndex::new(before.clone(), ExceptionTable::empty());
    let new = MetricIndex::new(after.clone(), ExceptionTable::empty());
    let mut ttk_changes = Vec::new();
    for c in new.catalog() {
        let Some(prev) = old.get(&c.weapon.name, &c.stat.barrel_type, &c.stat.ammo_type) else {
            continue;
        };
        let (Some(before_ms), Some(after_ms)) =
            (point_blank_ttk(&prev, modifiers), point_blank_ttk(&c, modifiers))
        else {
            continue;
        };
        if before_ms == after_ms {
            continue;
        }
        let base = f64::from(before_ms.max(1));
        let change = (f64::from(after_ms) - f64::from(before_ms)).abs() / base;
        if change <= DIFF_TTK_THRESHOLD {
            continue;
        }
        ttk_changes.push(TtkChange {
            weapon: c.weapon.name.clone(),
            barrel_type: c.stat.barrel_type.clone(),
            ammo_type: c.stat.ammo_type.clone(),
            before_ms,
            after_ms,
            direction: if after_ms < before_ms {
                TtkDirection::Faster
            } else {
                TtkDirection::Slower
            },
        });
    }

    TreeDiff {
        added_weapons: new_names.difference(&old_names).cloned().collect(),
        removed_weapons: old_names.difference(&new_names).cloned().collect(),
        ttk_changes,
    }
}
