//! Lookup index over one canonical tree.

use crate::extract::ExceptionTable;
use crate::model::{
    AmmoStat, CategoryTree, StatKey, Weapon, WeaponConfiguration, WeaponConfigurationStat,
};
use std::collections::HashMap;

/// A resolved configuration: the weapon, its stat and the ammo stats for its ammo type.
#[derive(Debug, Clone, Copy)]
pub struct ConfigStats<'a> {
    pub category: &'a str,
    pub weapon: &'a Weapon,
    pub stat: &'a WeaponConfigurationStat,
    pub ammo: Option<&'a AmmoStat>,
}

impl ConfigStats<'_> {
    pub fn configuration(&self) -> WeaponConfiguration {
        WeaponConfiguration::for_stat(self.weapon, self.stat)
    }

    /// Tie-break rank: Factory barrel first, then Standard ammo.
    pub fn default_rank(&self) -> (bool, bool) {
        (
            self.stat.barrel_type == "Factory",
            self.stat.ammo_type == "Standard",
        )
    }
}

/// (category, weapon) position in the tree.
type WeaponPos = (usize, usize);

/// Built once per tree; lookups are keyed by every field of a configuration.
#[derive(Debug, Clone)]
pub struct MetricIndex {
    tree: CategoryTree,
    weapons: HashMap<String, WeaponPos>,
    stats: HashMap<StatKey, (WeaponPos, usize)>,
    exceptions: ExceptionTable,
}

impl MetricIndex {
    pub fn new(tree: CategoryTree, exceptions: ExceptionTable) -> Self {
        let mut weapons = HashMap::new();
        let mut stats = HashMap::new();
        for (ci, category) in tree.categories.iter().enumerate() {
            for (wi, weapon) in category.weapons.iter().enumerate() {
                weapons.entry(weapon.name.clone()).or_insert((ci, wi));
                for (si, stat) in weapon.stats.iter().enumerate() {
                    let key = WeaponConfiguration::for_stat(weapon, stat).key();
                    stats.entry(key).or_insert(((ci, wi), si));
                }
            }
        }
        tracing::debug!(
            "indexed {} weapon(s), {} configuration(s)",
            weapons.len(),
            stats.len()
        );
        Self {
            tree,
            weapons,
            stats,
            exceptions,
        }
    }

    pub fn tree(&self) -> &CategoryTree {
        &self.tree
    }

    pub fn exceptions(&self) -> &ExceptionTable {
        &self.exceptions
    }

    fn resolve(&self, (ci, wi): WeaponPos, si: usize) -> ConfigStats<'_> {
        let category = &self.tree.categories[ci];
        let weapon = &category.weapons[wi];
        let stat = &weapon.stats[si];
        ConfigStats {
            category: &category.name,
            weapon,
            stat,
            ammo: weapon.ammo_stats.get(&stat.ammo_type),
        }
    }

    pub fn weapon(&self, name: &str) -> Option<&Weapon> {
        let &(ci, wi) = self.weapons.get(name)?;
        Some(&self.tree.categories[ci].weapons[wi])
    }

    pub fn category_of(&self, name: &str) -> Option<&str> {
        let &(ci, _) = self.weapons.get(name)?;
        Some(&self.tree.categories[ci].name)
    }

    pub fn get(&self, name: &str, barrel_type: &str, ammo_type: &str) -> Option<ConfigStats<'_>> {
        let key = StatKey {
            name: name.to_string(),
            barrel_type: barrel_type.to_string(),
            ammo_type: ammo_type.to_string(),
        };
        let &(pos, si) = self.stats.get(&key)?;
        Some(self.resolve(pos, si))
    }

    pub fn get_stats_for_configuration(
        &self,
        config: &WeaponConfiguration,
    ) -> Option<ConfigStats<'_>> {
        let &(pos, si) = self.stats.get(&config.key())?;
        Some(self.resolve(pos, si))
    }

    /// Every configuration of one weapon, in sheet order.
    pub fn weapon_configurations<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = ConfigStats<'a>> + 'a {
        let pos = self.weapons.get(name).copied();
        pos.into_iter().flat_map(move |p| {
            let len = self.tree.categories[p.0].weapons[p.1].stats.len();
            (0..len).map(move |si| self.resolve(p, si))
        })
    }

    /// Every configuration in the tree.
    pub fn catalog(&self) -> impl Iterator<Item = ConfigStats<'_>> {
        self.tree
            .categories
            .iter()
            .enumerate()
            .flat_map(move |(ci, c)| {
                c.weapons.iter().enumerate().flat_map(move |(wi, w)| {
                    (0..w.stats.len()).map(move |si| self.resolve((ci, wi), si))
                })
            })
    }

    /// The catalog minus weapons excluded from global scoring.
    pub fn global_population(&self) -> impl Iterator<Item = ConfigStats<'_>> {
        self.catalog()
            .filter(move |c| !self.exceptions.is_excluded(&c.weapon.name))
    }
}
