//! Configuration loading and validation.

use crate::extract::ExceptionTable;
use crate::metrics::{KillinessOptions, Modifiers, RpmSelector};
use crate::optimizer::OptimizerContext;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum size in bytes for a single exported sheet or workbook file.
pub const MAX_WORKBOOK_FILE_BYTES: usize = 32 * 1024 * 1024;

/// Maximum number of sheets read from one workbook source.
pub const MAX_SHEETS: usize = 2_000;

/// A merged range at least this wide separates one game patch's data from the next.
pub const PATCH_DIVIDER_MIN_COLUMNS: usize = 20;

/// Upper range (meters) always sampled by plots and reports.
pub const DEFAULT_MAX_RANGE: f64 = 150.0;

/// Default spacing (meters) of killiness sample ranges.
pub const DEFAULT_RANGE_STEP: f64 = 10.0;

/// Default fraction of hits landing on the head for killiness BTK.
pub const DEFAULT_HEADSHOT_RATIO: f64 = 0.25;

/// TTK change (fraction) reported by `diff`.
pub const DIFF_TTK_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutChoice {
    /// Pick per sheet from the metadata present.
    #[default]
    Auto,
    TabColor,
    MergedHeader,
}

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Workbook export: JSON file, directory of sheet JSON files, or .zip of them.
    pub workbook: PathBuf,
    /// Output directory for data.json, diagnostics, reports and SQLite DB.
    pub out_dir: PathBuf,
    pub layout: LayoutChoice,
}

impl ExtractConfig {
    pub fn new(workbook: PathBuf, out_dir: PathBuf) -> Self {
        Self {
            workbook,
            out_dir,
            layout: LayoutChoice::Auto,
        }
    }
}

/// Analysis settings shared by the metric engine, optimizer and reports.
/// Loaded from TOML; every field has a default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub killiness: KillinessOptions,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Weapons left out of global min/max scoring. `None` uses the built-in list.
    #[serde(default)]
    pub excluded_weapons: Option<Vec<String>>,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let s = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::from_toml(&s)
    }

    pub fn from_toml(s: &str) -> Result<Self, String> {
        let cfg: AnalysisConfig = toml::from_str(s).map_err(|e| e.to_string())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), String> {
        let m = &self.modifiers;
        if m.health_multiplier <= 0.0 {
            return Err("modifiers.health_multiplier must be positive".to_string());
        }
        if m.damage_multiplier < 0.0 || m.body_damage_multiplier < 0.0 {
            return Err("damage multipliers must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.killiness.headshot_ratio) {
            return Err("killiness.headshot_ratio must be within 0..=1".to_string());
        }
        if self.killiness.ranges.iter().any(|r| *r < 0.0) {
            return Err("killiness.ranges must not be negative".to_string());
        }
        Ok(())
    }

    /// Built-in corrections with the configured exclusion list, if any.
    pub fn exception_table(&self) -> ExceptionTable {
        let table = ExceptionTable::default();
        match &self.excluded_weapons {
            Some(list) => table.with_excluded(list.clone()),
            None => table,
        }
    }

    pub fn optimizer_context(&self) -> OptimizerContext {
        OptimizerContext {
            modifiers: self.modifiers.clone(),
            killiness: self.killiness.clone(),
            config: self.optimizer.clone(),
        }
    }
}

/// Options for the auto-configure features.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Barrels counted as suppressed for stealth builds.
    #[serde(default = "default_stealth_barrels")]
    pub stealth_barrels: Vec<String>,
    #[serde(default = "default_stealth_ammo")]
    pub stealth_ammo: String,
    #[serde(default)]
    pub rpm_selector: RpmSelector,
}

fn default_stealth_barrels() -> Vec<String> {
    vec!["NVK-SHH".to_string(), "Spook Y".to_string()]
}

fn default_stealth_ammo() -> String {
    "Subsonic".to_string()
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            stealth_barrels: default_stealth_barrels(),
            stealth_ammo: default_stealth_ammo(),
            rpm_selector: RpmSelector::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg = AnalysisConfig::from_toml("").unwrap();
        assert_eq!(cfg.modifiers.health_multiplier, 1.0);
        assert_eq!(cfg.optimizer.stealth_barrels, vec!["NVK-SHH", "Spook Y"]);
        assert!(cfg.excluded_weapons.is_none());
    }

    #[test]
    fn toml_overrides_nested_sections() {
        let cfg = AnalysisConfig::from_toml(
            r#"
            excluded_weapons = []

            [modifiers]
            health_multiplier = 2.0
            body_armor = true

            [optimizer]
            stealth_barrels = ["NVK-SHH", "GAR45", "Factory"]
            rpm_selector = "auto"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.modifiers.health_multiplier, 2.0);
        assert!(cfg.modifiers.body_armor);
        assert_eq!(cfg.modifiers.damage_multiplier, 1.0);
        assert_eq!(cfg.optimizer.stealth_barrels.len(), 3);
        assert_eq!(cfg.optimizer.rpm_selector, RpmSelector::Auto);
        assert_eq!(cfg.excluded_weapons, Some(vec![]));
        assert!(!cfg.exception_table().is_excluded("GHOSTMAKER R10"));
        assert!(AnalysisConfig::default()
            .exception_table()
            .is_excluded("GHOSTMAKER R10"));
    }

    #[test]
    fn invalid_headshot_ratio_rejected() {
        let r = AnalysisConfig::from_toml("[killiness]\nheadshot_ratio = 1.5\n");
        assert!(r.is_err());
    }
}
