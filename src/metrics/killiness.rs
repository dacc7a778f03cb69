//! Killiness: TTK, headshot-weighted BTK and kills-per-second, each min-max
//! normalized and blended by weight.

use super::{btk, damage_at_range, ttk, ConfigStats, MetricIndex, Modifiers, RpmSelector};
use crate::config::{DEFAULT_HEADSHOT_RATIO, DEFAULT_MAX_RANGE, DEFAULT_RANGE_STEP};
use crate::model::{AmmoStat, StatKey, WeaponConfiguration};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillinessWeights {
    #[serde(default = "default_ttk_weight")]
    pub ttk: f64,
    #[serde(default = "default_btk_weight")]
    pub btk: f64,
    #[serde(default = "default_kps_weight")]
    pub kps: f64,
}

fn default_ttk_weight() -> f64 {
    3.0
}

fn default_btk_weight() -> f64 {
    2.0
}

fn default_kps_weight() -> f64 {
    1.0
}

impl Default for KillinessWeights {
    fn default() -> Self {
        Self {
            ttk: default_ttk_weight(),
            btk: default_btk_weight(),
            kps: default_kps_weight(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillinessOptions {
    /// Sample ranges in meters.
    #[serde(default = "default_ranges")]
    pub ranges: Vec<f64>,
    /// Fraction of hits landing on the head for the BTK component.
    #[serde(default = "default_headshot_ratio")]
    pub headshot_ratio: f64,
    #[serde(default)]
    pub weights: KillinessWeights,
    #[serde(default)]
    pub rpm_selector: RpmSelector,
}

fn default_ranges() -> Vec<f64> {
    let steps = (DEFAULT_MAX_RANGE / DEFAULT_RANGE_STEP).round() as usize;
    (0..=steps).map(|i| i as f64 * DEFAULT_RANGE_STEP).collect()
}

fn default_headshot_ratio() -> f64 {
    DEFAULT_HEADSHOT_RATIO
}

impl Default for KillinessOptions {
    fn default() -> Self {
        Self {
            ranges: default_ranges(),
            headshot_ratio: default_headshot_ratio(),
            weights: KillinessWeights::default(),
            rpm_selector: RpmSelector::default(),
        }
    }
}

/// Which population min/max normalization runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationScope {
    /// The configurations currently shown.
    #[default]
    Visible,
    /// Every weapon not excluded from global scoring.
    Global,
}

/// Raw killiness inputs for one configuration, averaged over the sample ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KillinessComponents {
    pub avg_ttk: Option<f64>,
    pub avg_btk: Option<f64>,
    pub kps: Option<f64>,
}

impl KillinessComponents {
    pub fn compute(cfg: &ConfigStats<'_>, modifiers: &Modifiers, options: &KillinessOptions) -> Self {
        let rpm = options.rpm_selector.select(cfg.stat);
        let headshot = cfg
            .ammo
            .and_then(|a| a.headshot_multiplier)
            .unwrap_or(1.0);
        let blend = 1.0 - options.headshot_ratio + options.headshot_ratio * headshot;

        let mut ttks = Vec::new();
        let mut btks = Vec::new();
        let mut kps = Vec::new();
        for &range in &options.ranges {
            let Some(damage) = damage_at_range(&cfg.stat.dropoffs, range) else {
                continue;
            };
            if let Some(t) = ttk(cfg.ammo, modifiers, damage, rpm) {
                ttks.push(f64::from(t));
            }
            if let Some(b) = btk(cfg.ammo, modifiers, damage * blend) {
                btks.push(f64::from(b));
            }
            let body_btk = btk(cfg.ammo, modifiers, damage);
            if let Some(k) = kills_per_second(cfg.ammo, body_btk, rpm) {
                kps.push(k);
            }
        }
        Self {
            avg_ttk: mean(&ttks),
            avg_btk: mean(&btks),
            kps: mean(&kps),
        }
    }
}

/// Kills per second over a full magazine plus an empty reload.
pub fn kills_per_second(ammo: Option<&AmmoStat>, btk: Option<u32>, rpm: Option<u32>) -> Option<f64> {
    let ammo = ammo?;
    let mag = f64::from(ammo.mag_size.filter(|m| *m > 0)?);
    let reload = ammo.empty_reload?;
    let rpm = f64::from(rpm.filter(|r| *r > 0)?);
    let btk = f64::from(btk.filter(|b| *b > 0)?);
    Some((mag / btk) / (mag * 60.0 / rpm + reload))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    min: f64,
    max: f64,
}

impl Bounds {
    fn of(values: impl Iterator<Item = Option<f64>>) -> Option<Bounds> {
        values.flatten().fold(None, |acc, v| match acc {
            None => Some(Bounds { min: v, max: v }),
            Some(b) => Some(Bounds {
                min: b.min.min(v),
                max: b.max.max(v),
            }),
        })
    }

    /// 0..=1, 1 best. A flat population scores 1 for everyone.
    fn normalize(&self, value: f64, higher_is_better: bool) -> f64 {
        if self.max == self.min {
            return 1.0;
        }
        let t = (value - self.min) / (self.max - self.min);
        let t = if higher_is_better { t } else { 1.0 - t };
        t.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ComponentBounds {
    ttk: Option<Bounds>,
    btk: Option<Bounds>,
    kps: Option<Bounds>,
}

impl ComponentBounds {
    fn of<'a>(components: impl Iterator<Item = &'a KillinessComponents> + Clone) -> Self {
        Self {
            ttk: Bounds::of(components.clone().map(|c| c.avg_ttk)),
            btk: Bounds::of(components.clone().map(|c| c.avg_btk)),
            kps: Bounds::of(components.map(|c| c.kps)),
        }
    }
}

fn component_score(value: Option<f64>, bounds: Option<Bounds>, higher_is_better: bool) -> f64 {
    match (value, bounds) {
        (None, _) => 0.0,
        (Some(_), None) => 1.0,
        (Some(v), Some(b)) => b.normalize(v, higher_is_better),
    }
}

/// Killiness components for a whole catalog plus the global normalization bounds.
#[derive(Debug, Clone)]
pub struct KillinessTable {
    weights: KillinessWeights,
    components: HashMap<StatKey, KillinessComponents>,
    global: ComponentBounds,
}

impl KillinessTable {
    pub fn build(index: &MetricIndex, modifiers: &Modifiers, options: &KillinessOptions) -> Self {
        let components: HashMap<StatKey, KillinessComponents> = index
            .catalog()
            .map(|c| {
                (
                    c.configuration().key(),
                    KillinessComponents::compute(&c, modifiers, options),
                )
            })
            .collect();
        let global_keys: Vec<StatKey> = index
            .global_population()
            .map(|c| c.configuration().key())
            .collect();
        let global = ComponentBounds::of(global_keys.iter().filter_map(|k| components.get(k)));
        tracing::debug!(
            "killiness table over {} configuration(s), {} in global population",
            components.len(),
            global_keys.len()
        );
        Self {
            weights: options.weights.clone(),
            components,
            global,
        }
    }

    pub fn components(&self, config: &WeaponConfiguration) -> Option<&KillinessComponents> {
        self.components.get(&config.key())
    }

    fn blend(&self, c: &KillinessComponents, bounds: &ComponentBounds) -> Option<f64> {
        if c.avg_ttk.is_none() && c.avg_btk.is_none() && c.kps.is_none() {
            return None;
        }
        let w = &self.weights;
        let total = w.ttk + w.btk + w.kps;
        if total <= 0.0 {
            return None;
        }
        let score = w.ttk * component_score(c.avg_ttk, bounds.ttk, false)
            + w.btk * component_score(c.avg_btk, bounds.btk, false)
            + w.kps * component_score(c.kps, bounds.kps, true);
        Some(score / total)
    }

    /// Score against the global population.
    pub fn global_score(&self, config: &WeaponConfiguration) -> Option<f64> {
        self.blend(self.components(config)?, &self.global)
    }

    /// One score per input configuration, in order. Hidden or unknown
    /// configurations score `None` and do not take part in visible normalization.
    pub fn score(
        &self,
        configs: &[WeaponConfiguration],
        scope: NormalizationScope,
    ) -> Vec<Option<f64>> {
        let shown = || {
            configs
                .iter()
                .filter(|c| c.visible)
                .filter_map(|c| self.components(c))
        };
        let bounds = match scope {
            NormalizationScope::Global => self.global,
            NormalizationScope::Visible => ComponentBounds::of(shown()),
        };
        configs
            .iter()
            .map(|c| {
                if !c.visible {
                    return None;
                }
                self.blend(self.components(c)?, &bounds)
            })
            .collect()
    }
}
