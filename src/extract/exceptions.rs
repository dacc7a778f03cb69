//! Per-weapon corrections for known spreadsheet data-entry errors.
//!
//! These are not general rules. Each entry names one weapon; the default table
//! holds the corrections the published sheet currently needs.

use crate::model::{AmmoStat, DamageRange, Weapon, WeaponConfigurationStat};

/// A configuration the sheet omits that must be present.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedStat {
    pub weapon: String,
    pub barrel_type: String,
    pub ammo_type: String,
    pub dropoffs: Vec<DamageRange>,
}

/// Replace one weapon's ammo stats by fire-mode variants with their own headshot multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct AmmoSplit {
    pub weapon: String,
    pub variants: Vec<AmmoVariant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmmoVariant {
    /// Appended to the ammo name after a space, e.g. "(Single)".
    pub suffix: String,
    pub headshot_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTable {
    pub synthesized: Vec<SynthesizedStat>,
    pub ammo_splits: Vec<AmmoSplit>,
    /// Left out of global min/max scoring.
    pub excluded_from_global: Vec<String>,
}

impl Default for ExceptionTable {
    fn default() -> Self {
        Self {
            // The sheet has no Factory row for the explosive bolt.
            synthesized: vec![SynthesizedStat {
                weapon: "GHOSTMAKER R10".to_string(),
                barrel_type: "Factory".to_string(),
                ammo_type: "Explosive Bolt".to_string(),
                dropoffs: vec![DamageRange {
                    damage: 132.5,
                    range: 0.0,
                }],
            }],
            // One capacity row covers both fire modes, which headshot differently.
            ammo_splits: vec![AmmoSplit {
                weapon: "RORSCH MK-4".to_string(),
                variants: vec![
                    AmmoVariant {
                        suffix: "(Burst/Auto)".to_string(),
                        headshot_multiplier: 1.9,
                    },
                    AmmoVariant {
                        suffix: "(Single)".to_string(),
                        headshot_multiplier: 3.0,
                    },
                ],
            }],
            excluded_from_global: vec!["GHOSTMAKER R10".to_string(), "RORSCH MK-4".to_string()],
        }
    }
}

fn same_weapon(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl ExceptionTable {
    /// No corrections at all.
    pub fn empty() -> Self {
        Self {
            synthesized: Vec::new(),
            ammo_splits: Vec::new(),
            excluded_from_global: Vec::new(),
        }
    }

    pub fn with_excluded(mut self, excluded: Vec<String>) -> Self {
        self.excluded_from_global = excluded;
        self
    }

    pub fn is_excluded(&self, weapon: &str) -> bool {
        self.excluded_from_global
            .iter()
            .any(|w| same_weapon(w, weapon))
    }

    /// Ammo stats to store for one capacity row: the row itself, or its split variants.
    pub fn split_ammo_stat(
        &self,
        weapon: &str,
        ammo_name: &str,
        stat: AmmoStat,
    ) -> Vec<(String, AmmoStat)> {
        match self.ammo_splits.iter().find(|s| same_weapon(&s.weapon, weapon)) {
            Some(split) => split
                .variants
                .iter()
                .map(|v| {
                    (
                        format!("{} {}", ammo_name, v.suffix),
                        AmmoStat {
                            headshot_multiplier: Some(v.headshot_multiplier),
                            ..stat.clone()
                        },
                    )
                })
                .collect(),
            None => vec![(ammo_name.to_string(), stat)],
        }
    }

    /// Add every configured stat this weapon is missing. Returns the (barrel, ammo) pairs added.
    pub fn synthesize_missing(&self, weapon: &mut Weapon) -> Vec<(String, String)> {
        let mut added = Vec::new();
        for s in self
            .synthesized
            .iter()
            .filter(|s| same_weapon(&s.weapon, &weapon.name))
        {
            if weapon.has_stat(&s.barrel_type, &s.ammo_type) {
                continue;
            }
            let mut stat = WeaponConfigurationStat::new(&s.barrel_type, &s.ammo_type);
            stat.dropoffs = s.dropoffs.clone();
            weapon.stats.push(stat);
            added.push((s.barrel_type.clone(), s.ammo_type.clone()));
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghostmaker_gets_explosive_bolt_when_missing() {
        let table = ExceptionTable::default();
        let mut w = Weapon::new("GHOSTMAKER R10");
        let added = table.synthesize_missing(&mut w);
        assert_eq!(added, vec![("Factory".to_string(), "Explosive Bolt".to_string())]);
        let s = w.stat("Factory", "Explosive Bolt").unwrap();
        assert_eq!(
            s.dropoffs,
            vec![DamageRange {
                damage: 132.5,
                range: 0.0
            }]
        );
        // Second pass is a no-op.
        assert!(table.synthesize_missing(&mut w).is_empty());
        assert_eq!(w.stats.len(), 1);
    }

    #[test]
    fn extracted_explosive_bolt_is_kept() {
        let table = ExceptionTable::default();
        let mut w = Weapon::new("GHOSTMAKER R10");
        let mut s = WeaponConfigurationStat::new("Factory", "Explosive Bolt");
        s.dropoffs.push(DamageRange {
            damage: 140.0,
            range: 0.0,
        });
        w.stats.push(s);
        assert!(table.synthesize_missing(&mut w).is_empty());
        assert_eq!(w.stats[0].dropoffs[0].damage, 140.0);
    }

    #[test]
    fn rorsch_ammo_splits_into_fire_modes() {
        let table = ExceptionTable::default();
        let stat = AmmoStat {
            mag_size: Some(10),
            headshot_multiplier: Some(2.0),
            ..AmmoStat::default()
        };
        let out = table.split_ammo_stat("Rorsch Mk-4", "Rorsch Round", stat.clone());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, "Rorsch Round (Burst/Auto)");
        assert_eq!(out[0].1.headshot_multiplier, Some(1.9));
        assert_eq!(out[0].1.mag_size, Some(10));
        assert_eq!(out[1].0, "Rorsch Round (Single)");
        assert_eq!(out[1].1.headshot_multiplier, Some(3.0));

        let other = table.split_ammo_stat("M5A3", "Standard", stat.clone());
        assert_eq!(other, vec![("Standard".to_string(), stat)]);
    }

    #[test]
    fn exclusion_is_case_insensitive() {
        let table = ExceptionTable::default();
        assert!(table.is_excluded("Ghostmaker R10"));
        assert!(!table.is_excluded("M5A3"));
        assert!(!ExceptionTable::empty().is_excluded("GHOSTMAKER R10"));
    }
}
