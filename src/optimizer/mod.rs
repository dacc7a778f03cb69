//! Auto-configure: bulk selection over configurations.
//!
//! `maximize`, `select` and `filter` are total over their input: missing
//! stats, rpm or ammo data score 0 or fail the predicate, never panic.

use crate::config::OptimizerConfig;
use crate::metrics::{
    damage_at_range, ttk, ConfigStats, KillinessOptions, KillinessTable, MetricIndex, Modifiers,
};
use crate::model::WeaponConfiguration;
use std::cmp::Ordering;

/// For each configuration, switch to the weapon's stat with the highest score.
/// Ties go to the Factory barrel, then Standard ammo, then sheet order.
pub fn maximize<F>(
    index: &MetricIndex,
    configs: &[WeaponConfiguration],
    scorer: F,
) -> Vec<WeaponConfiguration>
where
    F: Fn(&ConfigStats<'_>) -> Option<f64>,
{
    configs
        .iter()
        .map(|config| {
            let best = index
                .weapon_configurations(&config.name)
                .map(|c| (scorer(&c).unwrap_or(0.0), c))
                .fold(None::<(f64, ConfigStats<'_>)>, |best, (score, c)| match best {
                    None => Some((score, c)),
                    Some((top, incumbent)) => match score.total_cmp(&top) {
                        Ordering::Greater => Some((score, c)),
                        Ordering::Equal if c.default_rank() > incumbent.default_rank() => {
                            Some((score, c))
                        }
                        _ => Some((top, incumbent)),
                    },
                });
            match best {
                Some((_, c)) => WeaponConfiguration {
                    visible: config.visible,
                    ..c.configuration()
                },
                None => config.clone(),
            }
        })
        .collect()
}

/// Every (weapon, stat) pair in the catalog satisfying `predicate`.
pub fn select<F>(index: &MetricIndex, predicate: F) -> Vec<WeaponConfiguration>
where
    F: Fn(&ConfigStats<'_>) -> bool,
{
    index
        .catalog()
        .filter(|c| predicate(c))
        .map(|c| c.configuration())
        .collect()
}

/// Keep configurations whose stats satisfy `predicate`. Configurations with
/// no stats in the tree are dropped.
pub fn filter<F>(
    index: &MetricIndex,
    configs: &[WeaponConfiguration],
    predicate: F,
) -> Vec<WeaponConfiguration>
where
    F: Fn(&ConfigStats<'_>) -> bool,
{
    configs
        .iter()
        .filter(|config| {
            index
                .get_stats_for_configuration(config)
                .is_some_and(|c| predicate(&c))
        })
        .cloned()
        .collect()
}

/// Preset auto-configure actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Lowest TTK at `range` meters.
    MinTtk { range: f64 },
    MaxRpm,
    MaxVelocity,
    MaxMagazine,
    /// Best global killiness score.
    Killiness,
    /// Every suppressed barrel + stealth ammo configuration in the catalog.
    Stealth,
}

/// Minimum thresholds a configuration must meet. Unset fields always pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requirements {
    /// (max TTK in ms, at range in meters)
    pub max_ttk: Option<(u32, f64)>,
    pub min_velocity: Option<u32>,
    pub min_mag_size: Option<u32>,
}

/// Settings the presets read.
#[derive(Debug, Clone, Default)]
pub struct OptimizerContext {
    pub modifiers: Modifiers,
    pub killiness: KillinessOptions,
    pub config: OptimizerConfig,
}

impl OptimizerContext {
    fn ttk_at(&self, c: &ConfigStats<'_>, range: f64) -> Option<u32> {
        let damage = damage_at_range(&c.stat.dropoffs, range)?;
        ttk(c.ammo, &self.modifiers, damage, self.config.rpm_selector.select(c.stat))
    }

    fn is_stealth(&self, c: &ConfigStats<'_>) -> bool {
        self.config
            .stealth_barrels
            .iter()
            .any(|b| *b == c.stat.barrel_type)
            && c.stat.ammo_type == self.config.stealth_ammo
    }

    pub fn meets(&self, c: &ConfigStats<'_>, req: &Requirements) -> bool {
        if let Some((max_ms, range)) = req.max_ttk {
            if !self.ttk_at(c, range).is_some_and(|t| t <= max_ms) {
                return false;
            }
        }
        if let Some(min) = req.min_velocity {
            if !c.stat.velocity.is_some_and(|v| v >= min) {
                return false;
            }
        }
        if let Some(min) = req.min_mag_size {
            if !c.ammo.and_then(|a| a.mag_size).is_some_and(|m| m >= min) {
                return false;
            }
        }
        true
    }

    /// Run a preset over `configs`. `Stealth` replaces the selection with
    /// catalog matches; the others keep one configuration per input.
    pub fn apply(
        &self,
        index: &MetricIndex,
        configs: &[WeaponConfiguration],
        strategy: Strategy,
    ) -> Vec<WeaponConfiguration> {
        tracing::debug!("optimizer {:?} over {} configuration(s)", strategy, configs.len());
        match strategy {
            Strategy::MinTtk { range } => maximize(index, configs, |c| {
                self.ttk_at(c, range).map(|t| 1.0 / (1.0 + f64::from(t)))
            }),
            Strategy::MaxRpm => maximize(index, configs, |c| {
                self.config.rpm_selector.select(c.stat).map(f64::from)
            }),
            Strategy::MaxVelocity => maximize(index, configs, |c| c.stat.velocity.map(f64::from)),
            Strategy::MaxMagazine => maximize(index, configs, |c| {
                c.ammo.and_then(|a| a.mag_size).map(f64::from)
            }),
            Strategy::Killiness => {
                let table = KillinessTable::build(index, &self.modifiers, &self.killiness);
                maximize(index, configs, |c| table.global_score(&c.configuration()))
            }
            Strategy::Stealth => select(index, |c| self.is_stealth(c)),
        }
    }

    pub fn filter_requirements(
        &self,
        index: &MetricIndex,
        configs: &[WeaponConfiguration],
        req: &Requirements,
    ) -> Vec<WeaponConfiguration> {
        filter(index, configs, |c| self.meets(c, req))
    }
}

/// Insert a copy of `configs[at]` right after it. False when out of range.
pub fn duplicate(configs: &mut Vec<WeaponConfiguration>, at: usize) -> bool {
    match configs.get(at).cloned() {
        Some(c) => {
            configs.insert(at + 1, c);
            true
        }
        None => false,
    }
}

pub fn remove(configs: &mut Vec<WeaponConfiguration>, at: usize) -> Option<WeaponConfiguration> {
    (at < configs.len()).then(|| configs.remove(at))
}

pub fn set_visible(configs: &mut [WeaponConfiguration], at: usize, visible: bool) -> bool {
    match configs.get_mut(at) {
        Some(c) => {
            c.visible = visible;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExceptionTable;
    use crate::model::{
        AmmoStat, CategoryTree, DamageRange, Weapon, WeaponCategory, WeaponConfigurationStat,
    };

    fn stat(
        barrel: &str,
        ammo: &str,
        damage: f64,
        rpm: Option<u32>,
        velocity: Option<u32>,
    ) -> WeaponConfigurationStat {
        let mut s = WeaponConfigurationStat::new(barrel, ammo);
        s.dropoffs = vec![
            DamageRange { damage, range: 0.0 },
            DamageRange {
                damage: damage * 0.8,
                range: 40.0,
            },
        ];
        s.rpm_auto = rpm;
        s.velocity = velocity;
        s
    }

    fn index() -> MetricIndex {
        let mut rifle = Weapon::new("M5A3");
        rifle.stats = vec![
            stat("Extended", "Standard", 25.0, Some(600), Some(900)),
            stat("Factory", "Standard", 25.0, Some(600), Some(800)),
            stat("NVK-SHH", "Subsonic", 20.0, Some(600), Some(500)),
            stat("Factory", "High Power", 34.0, Some(500), None),
        ];
        for (name, mag) in [("Standard", 30), ("Subsonic", 30), ("High Power", 20)] {
            rifle.ammo_stats.insert(
                name.to_string(),
                AmmoStat {
                    mag_size: Some(mag),
                    empty_reload: Some(2.5),
                    ..AmmoStat::default()
                },
            );
        }
        let mut pistol = Weapon::new("PB-9");
        pistol.stats = vec![
            stat("Spook Y", "Subsonic", 18.0, None, Some(400)),
            stat("Factory", "Subsonic", 18.0, None, Some(420)),
        ];
        MetricIndex::new(
            CategoryTree {
                categories: vec![WeaponCategory {
                    name: "Mixed".to_string(),
                    weapons: vec![rifle, pistol],
                }],
            },
            ExceptionTable::empty(),
        )
    }

    fn barrel_ammo(configs: &[WeaponConfiguration]) -> Vec<(&str, &str)> {
        configs
            .iter()
            .map(|c| (c.barrel_type.as_str(), c.ammo_type.as_str()))
            .collect()
    }

    #[test]
    fn maximize_prefers_factory_on_ties() {
        let idx = index();
        let start = vec![WeaponConfiguration::new("M5A3", "NVK-SHH", "Subsonic")];
        // Three stats tie at 600 rpm.
        let out = maximize(&idx, &start, |c| c.stat.rpm_auto.map(f64::from));
        assert_eq!(barrel_ammo(&out), vec![("Factory", "Standard")]);
    }

    #[test]
    fn maximize_is_total() {
        let idx = index();
        assert!(maximize(&idx, &[], |_| Some(1.0)).is_empty());
        // No rpm anywhere: every stat scores 0, tie-break picks Factory.
        let out = maximize(&idx, &[WeaponConfiguration::new("PB-9", "Spook Y", "Subsonic")], |c| {
            c.stat.rpm_auto.map(f64::from)
        });
        assert_eq!(barrel_ammo(&out), vec![("Factory", "Subsonic")]);
        let mut unknown = WeaponConfiguration::new("Nope", "Factory", "Standard");
        unknown.visible = false;
        let out = maximize(&idx, std::slice::from_ref(&unknown), |_| Some(1.0));
        assert_eq!(out, vec![unknown]);
    }

    #[test]
    fn presets() {
        let idx = index();
        let ctx = OptimizerContext::default();
        let start = vec![WeaponConfiguration::new("M5A3", "Factory", "Standard")];
        let out = ctx.apply(&idx, &start, Strategy::MinTtk { range: 0.0 });
        // 34 dmg: 3 hits at 500 rpm = 240ms, vs 25 dmg: 4 hits at 600 = 300ms.
        assert_eq!(barrel_ammo(&out), vec![("Factory", "High Power")]);
        let out = ctx.apply(&idx, &start, Strategy::MaxVelocity);
        assert_eq!(barrel_ammo(&out), vec![("Extended", "Standard")]);
        let out = ctx.apply(&idx, &start, Strategy::MaxMagazine);
        assert_eq!(barrel_ammo(&out), vec![("Factory", "Standard")]);
        let out = ctx.apply(&idx, &start, Strategy::MaxRpm);
        assert_eq!(barrel_ammo(&out), vec![("Factory", "Standard")]);
        let out = ctx.apply(&idx, &start, Strategy::Killiness);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn stealth_selects_across_catalog_with_configured_barrels() {
        let idx = index();
        let mut ctx = OptimizerContext::default();
        let out = ctx.apply(&idx, &[], Strategy::Stealth);
        assert_eq!(
            barrel_ammo(&out),
            vec![("NVK-SHH", "Subsonic"), ("Spook Y", "Subsonic")]
        );
        ctx.config.stealth_barrels.push("Factory".to_string());
        assert_eq!(ctx.apply(&idx, &[], Strategy::Stealth).len(), 3);
    }

    #[test]
    fn requirements_filter_current_selection() {
        let idx = index();
        let ctx = OptimizerContext::default();
        let configs = vec![
            WeaponConfiguration::new("M5A3", "Factory", "Standard"),
            WeaponConfiguration::new("M5A3", "Factory", "High Power"),
            WeaponConfiguration::new("PB-9", "Spook Y", "Subsonic"),
            WeaponConfiguration::new("Gone", "Factory", "Standard"),
        ];
        let req = Requirements {
            min_velocity: Some(700),
            ..Requirements::default()
        };
        let out = ctx.filter_requirements(&idx, &configs, &req);
        assert_eq!(barrel_ammo(&out), vec![("Factory", "Standard")]);

        let req = Requirements {
            max_ttk: Some((250, 0.0)),
            ..Requirements::default()
        };
        let out = ctx.filter_requirements(&idx, &configs, &req);
        assert_eq!(barrel_ammo(&out), vec![("Factory", "High Power")]);

        let req = Requirements {
            min_mag_size: Some(25),
            ..Requirements::default()
        };
        // PB-9 has no ammo stats: fails rather than erroring.
        assert_eq!(ctx.filter_requirements(&idx, &configs, &req).len(), 1);
        assert_eq!(ctx.filter_requirements(&idx, &configs, &Requirements::default()).len(), 3);
    }

    #[test]
    fn selection_helpers() {
        let mut configs = vec![WeaponConfiguration::new("A", "Factory", "Standard")];
        assert!(duplicate(&mut configs, 0));
        assert!(!duplicate(&mut configs, 5));
        assert_eq!(configs.len(), 2);
        assert!(set_visible(&mut configs, 1, false));
        assert!(!configs[1].visible);
        assert!(remove(&mut configs, 0).is_some());
        assert!(remove(&mut configs, 3).is_none());
        assert_eq!(configs.len(), 1);
        assert!(!configs[0].visible);
    }
}
