//! Canonical weapon data model: categories, weapons, configurations, dropoff curves.
//!
//! This is the shape of the `data.json` file. Optional numbers are omitted
//! when the sheet does not provide them; absence means unknown, never zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTree {
    pub categories: Vec<WeaponCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponCategory {
    pub name: String,
    pub weapons: Vec<Weapon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    /// Unique across the whole tree.
    pub name: String,
    /// In the order the extractor met them.
    pub stats: Vec<WeaponConfigurationStat>,
    #[serde(default)]
    pub ammo_stats: BTreeMap<String, AmmoStat>,
}

/// One barrel + ammo combination of a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponConfigurationStat {
    pub barrel_type: String,
    pub ammo_type: String,
    /// Step curve ordered by strictly increasing range.
    pub dropoffs: Vec<DamageRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm_single: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm_burst: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpm_auto: Option<u32>,
}

/// Damage from `range` meters up to the next breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRange {
    pub damage: f64,
    pub range: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmoStat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mag_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_reload: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactical_reload: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headshot_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pellet_count: Option<u32>,
}

/// A user's pick of one configuration stat. Joined to the tree by key at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponConfiguration {
    pub name: String,
    pub barrel_type: String,
    pub ammo_type: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Lookup key over all three fields of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatKey {
    pub name: String,
    pub barrel_type: String,
    pub ammo_type: String,
}

impl WeaponConfiguration {
    pub fn new(name: &str, barrel_type: &str, ammo_type: &str) -> Self {
        Self {
            name: name.to_string(),
            barrel_type: barrel_type.to_string(),
            ammo_type: ammo_type.to_string(),
            visible: true,
        }
    }

    pub fn for_stat(weapon: &Weapon, stat: &WeaponConfigurationStat) -> Self {
        Self::new(&weapon.name, &stat.barrel_type, &stat.ammo_type)
    }

    pub fn key(&self) -> StatKey {
        StatKey {
            name: self.name.clone(),
            barrel_type: self.barrel_type.clone(),
            ammo_type: self.ammo_type.clone(),
        }
    }
}

impl WeaponConfigurationStat {
    pub fn new(barrel_type: &str, ammo_type: &str) -> Self {
        Self {
            barrel_type: barrel_type.to_string(),
            ammo_type: ammo_type.to_string(),
            dropoffs: Vec::new(),
            velocity: None,
            rpm_single: None,
            rpm_burst: None,
            rpm_auto: None,
        }
    }

    pub fn max_range(&self) -> Option<f64> {
        self.dropoffs.last().map(|d| d.range)
    }
}

impl Weapon {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stats: Vec::new(),
            ammo_stats: BTreeMap::new(),
        }
    }

    pub fn stat(&self, barrel_type: &str, ammo_type: &str) -> Option<&WeaponConfigurationStat> {
        self.stats
            .iter()
            .find(|s| s.barrel_type == barrel_type && s.ammo_type == ammo_type)
    }

    pub fn has_stat(&self, barrel_type: &str, ammo_type: &str) -> bool {
        self.stat(barrel_type, ammo_type).is_some()
    }
}

impl CategoryTree {
    pub fn from_json(s: &str) -> Result<Self, String> {
        serde_json::from_str(s).map_err(|e| e.to_string())
    }

    pub fn to_json_pretty(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| e.to_string())
    }

    pub fn weapons(&self) -> impl Iterator<Item = &Weapon> {
        self.categories.iter().flat_map(|c| c.weapons.iter())
    }

    /// Weapons paired with the name of their category.
    pub fn weapons_with_category(&self) -> impl Iterator<Item = (&str, &Weapon)> {
        self.categories
            .iter()
            .flat_map(|c| c.weapons.iter().map(move |w| (c.name.as_str(), w)))
    }

    pub fn find_weapon(&self, name: &str) -> Option<&Weapon> {
        self.weapons().find(|w| w.name == name)
    }

    pub fn weapon_count(&self) -> usize {
        self.categories.iter().map(|c| c.weapons.len()).sum()
    }

    pub fn stat_count(&self) -> usize {
        self.weapons().map(|w| w.stats.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CategoryTree {
        let mut stat = WeaponConfigurationStat::new("Factory", "Standard");
        stat.dropoffs = vec![
            DamageRange {
                damage: 25.0,
                range: 0.0,
            },
            DamageRange {
                damage: 20.0,
                range: 30.0,
            },
        ];
        stat.rpm_auto = Some(600);
        let mut weapon = Weapon::new("M5A3");
        weapon.stats.push(stat);
        weapon.ammo_stats.insert(
            "Standard".to_string(),
            AmmoStat {
                mag_size: Some(30),
                empty_reload: Some(0.0),
                ..AmmoStat::default()
            },
        );
        CategoryTree {
            categories: vec![WeaponCategory {
                name: "Assault Rifles".to_string(),
                weapons: vec![weapon],
            }],
        }
    }

    #[test]
    fn json_uses_camel_case_and_omits_unknowns() {
        let json = sample().to_json_pretty().unwrap();
        assert!(json.contains("\"barrelType\": \"Factory\""));
        assert!(json.contains("\"ammoStats\""));
        assert!(json.contains("\"rpmAuto\": 600"));
        assert!(json.contains("\"emptyReload\": 0.0"));
        assert!(!json.contains("rpmSingle"));
        assert!(!json.contains("velocity"));
        assert!(!json.contains("tacticalReload"));
        assert!(!json.contains("null"));
    }

    #[test]
    fn json_reads_back_equal() {
        let tree = sample();
        let back = CategoryTree::from_json(&tree.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn lookups() {
        let tree = sample();
        let w = tree.find_weapon("M5A3").unwrap();
        assert!(w.has_stat("Factory", "Standard"));
        assert!(!w.has_stat("Factory", "Subsonic"));
        assert_eq!(w.stats[0].max_range(), Some(30.0));
        assert_eq!(tree.weapon_count(), 1);
        assert_eq!(tree.stat_count(), 1);
        assert!(tree.find_weapon("m5a3").is_none());
    }

    #[test]
    fn configuration_keys_distinguish_all_fields() {
        let a = WeaponConfiguration::new("A", "Factory", "Standard").key();
        let b = WeaponConfiguration::new("A", "Factory", "Subsonic").key();
        let c = WeaponConfiguration::new("A", "Extended", "Standard").key();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }
}
