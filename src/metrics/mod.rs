//! Derived combat metrics: bullets-to-kill, time-to-kill, required ranges, killiness.
//!
//! Every metric is `Option`: unknown inputs (no rpm, zero damage, no ammo stats)
//! propagate as `None` and are never turned into zero, NaN or infinity.

mod index;
mod killiness;

pub use index::{ConfigStats, MetricIndex};
pub use killiness::{
    kills_per_second, KillinessComponents, KillinessOptions, KillinessTable, KillinessWeights,
    NormalizationScope,
};

use crate::config::DEFAULT_MAX_RANGE;
use crate::model::{AmmoStat, DamageRange, WeaponConfigurationStat};
use serde::{Deserialize, Serialize};

/// Target health before modifiers.
pub const BASE_HEALTH: f64 = 100.0;

/// Plating added to the target by body armor.
pub const ARMOR_PLATING: f64 = 50.0;

/// A hit leaving this much health or less still kills.
const HEALTH_ROUNDING: f64 = 0.5;

/// Game-mode damage and health modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default = "one")]
    pub health_multiplier: f64,
    #[serde(default = "one")]
    pub damage_multiplier: f64,
    #[serde(default = "one")]
    pub body_damage_multiplier: f64,
    #[serde(default)]
    pub body_armor: bool,
}

fn one() -> f64 {
    1.0
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            health_multiplier: 1.0,
            damage_multiplier: 1.0,
            body_damage_multiplier: 1.0,
            body_armor: false,
        }
    }
}

impl Modifiers {
    pub fn effective_health(&self) -> f64 {
        let plating = if self.body_armor { ARMOR_PLATING } else { 0.0 };
        (BASE_HEALTH + plating) * self.health_multiplier - HEALTH_ROUNDING
    }

    pub fn effective_damage(&self, damage: f64, pellets: f64) -> f64 {
        damage * self.damage_multiplier * self.body_damage_multiplier * pellets
    }
}

/// Hits per shot: the pellet count for shotgun ammo, else 1.
pub fn pellet_multiplier(ammo: Option<&AmmoStat>) -> f64 {
    ammo.and_then(|a| a.pellet_count)
        .map(f64::from)
        .unwrap_or(1.0)
}

/// Bullets to kill with `damage` per hit. `None` when a hit does no damage.
pub fn btk(ammo: Option<&AmmoStat>, modifiers: &Modifiers, damage: f64) -> Option<u32> {
    let per_hit = modifiers.effective_damage(damage, pellet_multiplier(ammo));
    if !per_hit.is_finite() || per_hit <= 0.0 {
        return None;
    }
    let hits = (modifiers.effective_health() / per_hit).ceil().max(1.0);
    if hits > f64::from(u32::MAX) {
        return None;
    }
    Some(hits as u32)
}

/// Time to kill in milliseconds. `None` for unknown or zero rpm.
pub fn ttk(
    ammo: Option<&AmmoStat>,
    modifiers: &Modifiers,
    damage: f64,
    rpm: Option<u32>,
) -> Option<u32> {
    let rpm = rpm.filter(|r| *r > 0)?;
    let hits = btk(ammo, modifiers, damage)?;
    let ms = 1000.0 / (f64::from(rpm) / 60.0) * f64::from(hits - 1);
    Some(ms.round() as u32)
}

/// Damage per hit at `range` on a step curve. Ranges before the first
/// breakpoint read the first one.
pub fn damage_at_range(dropoffs: &[DamageRange], range: f64) -> Option<f64> {
    dropoffs
        .iter()
        .rev()
        .find(|d| d.range <= range)
        .or_else(|| dropoffs.first())
        .map(|d| d.damage)
}

/// Which fire mode's rpm a metric uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum RpmSelector {
    Single,
    Burst,
    Auto,
    /// Highest known rpm across fire modes.
    #[default]
    Fastest,
    Slowest,
}

impl RpmSelector {
    pub fn select(self, stat: &WeaponConfigurationStat) -> Option<u32> {
        let known = || {
            [stat.rpm_single, stat.rpm_burst, stat.rpm_auto]
                .into_iter()
                .flatten()
                .filter(|r| *r > 0)
        };
        match self {
            RpmSelector::Single => stat.rpm_single,
            RpmSelector::Burst => stat.rpm_burst,
            RpmSelector::Auto => stat.rpm_auto,
            RpmSelector::Fastest => known().max(),
            RpmSelector::Slowest => known().min(),
        }
    }
}

/// Ranges where `convert(config, damage)` changes for at least one configuration,
/// plus 0, the default plot maximum and the largest breakpoint seen. Sorted, no repeats.
pub fn required_ranges<'a, 'b, I, F>(population: I, convert: F) -> Vec<f64>
where
    'a: 'b,
    I: IntoIterator<Item = &'b ConfigStats<'a>>,
    F: Fn(&ConfigStats<'a>, f64) -> Option<f64>,
{
    let mut out = vec![0.0, DEFAULT_MAX_RANGE];
    let mut max_seen: f64 = 0.0;
    for cfg in population {
        let mut previous: Option<Option<f64>> = None;
        for d in &cfg.stat.dropoffs {
            max_seen = max_seen.max(d.range);
            let value = convert(cfg, d.damage);
            if previous.is_some_and(|p| p != value) {
                out.push(d.range);
            }
            previous = Some(value);
        }
    }
    out.push(max_seen);
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Weapon;

    fn curve(points: &[(f64, f64)]) -> Vec<DamageRange> {
        points
            .iter()
            .map(|&(damage, range)| DamageRange { damage, range })
            .collect()
    }

    #[test]
    fn btk_default_modifiers() {
        assert_eq!(btk(None, &Modifiers::default(), 25.0), Some(4));
        // 99.75 effective damage kills at 100 health.
        assert_eq!(btk(None, &Modifiers::default(), 99.75), Some(1));
        assert_eq!(btk(None, &Modifiers::default(), 0.0), None);
    }

    #[test]
    fn btk_applies_pellets_armor_and_multipliers() {
        let buck = AmmoStat {
            pellet_count: Some(8),
            ..AmmoStat::default()
        };
        // 8 x 10 = 80 per shot.
        assert_eq!(btk(Some(&buck), &Modifiers::default(), 10.0), Some(2));
        let armored = Modifiers {
            body_armor: true,
            ..Modifiers::default()
        };
        // 149.5 / 25
        assert_eq!(btk(None, &armored, 25.0), Some(6));
        let hardcore = Modifiers {
            health_multiplier: 0.5,
            damage_multiplier: 1.0,
            body_damage_multiplier: 0.8,
            body_armor: false,
        };
        // 49.5 / 20
        assert_eq!(btk(None, &hardcore, 25.0), Some(3));
    }

    #[test]
    fn ttk_from_rpm() {
        let m = Modifiers::default();
        assert_eq!(ttk(None, &m, 25.0, Some(600)), Some(300));
        assert_eq!(ttk(None, &m, 25.0, Some(0)), None);
        assert_eq!(ttk(None, &m, 25.0, None), None);
        assert_eq!(ttk(None, &m, 120.0, Some(60)), Some(0));
        // 1000 / 12.5 * 3 = 240
        assert_eq!(ttk(None, &m, 25.0, Some(750)), Some(240));
    }

    #[test]
    fn damage_lookup_is_a_step_function() {
        let d = curve(&[(25.0, 0.0), (20.0, 30.0), (15.0, 60.0)]);
        assert_eq!(damage_at_range(&d, 0.0), Some(25.0));
        assert_eq!(damage_at_range(&d, 29.9), Some(25.0));
        assert_eq!(damage_at_range(&d, 30.0), Some(20.0));
        assert_eq!(damage_at_range(&d, 500.0), Some(15.0));
        assert_eq!(damage_at_range(&curve(&[(30.0, 5.0)]), 0.0), Some(30.0));
        assert_eq!(damage_at_range(&[], 10.0), None);
    }

    #[test]
    fn rpm_selector_picks_modes() {
        let mut s = WeaponConfigurationStat::new("Factory", "Standard");
        s.rpm_single = Some(300);
        s.rpm_auto = Some(750);
        s.rpm_burst = Some(0);
        assert_eq!(RpmSelector::Fastest.select(&s), Some(750));
        assert_eq!(RpmSelector::Slowest.select(&s), Some(300));
        assert_eq!(RpmSelector::Burst.select(&s), Some(0));
        s.rpm_single = None;
        s.rpm_auto = None;
        assert_eq!(RpmSelector::Fastest.select(&s), None);
    }

    #[test]
    fn required_ranges_keep_changes_and_bounds() {
        let weapon = Weapon::new("A");
        let mut a = WeaponConfigurationStat::new("Factory", "Standard");
        a.dropoffs = curve(&[(25.0, 0.0), (24.0, 20.0), (19.0, 40.0), (19.0, 200.0)]);
        let mut b = WeaponConfigurationStat::new("Factory", "Subsonic");
        b.dropoffs = curve(&[(50.0, 0.0), (34.0, 35.0)]);
        let population = vec![
            ConfigStats {
                category: "C",
                weapon: &weapon,
                stat: &a,
                ammo: None,
            },
            ConfigStats {
                category: "C",
                weapon: &weapon,
                stat: &b,
                ammo: None,
            },
        ];
        let m = Modifiers::default();
        let ranges = required_ranges(&population, |c, dmg| {
            btk(c.ammo, &m, dmg).map(f64::from)
        });
        // a: 4 -> 5 at 20, 5 -> 6 at 40; b: 2 -> 3 at 35.
        assert_eq!(ranges, vec![0.0, 20.0, 35.0, 40.0, 150.0, 200.0]);

        let flat: Vec<ConfigStats<'_>> = Vec::new();
        assert_eq!(required_ranges(&flat, |_, d| Some(d)), vec![0.0, 150.0]);
    }
}
