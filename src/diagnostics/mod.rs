//! Extraction diagnostics: severity, location, explanation.
//!
//! Nothing in the extraction pipeline returns an error for bad sheet data;
//! problems are recorded here and the offending cell, row or block is skipped.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    /// Zero-based sheet row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

impl Diagnostic {
    fn new(code: &str, severity: Severity, message: String) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message,
            sheet: None,
            weapon: None,
            row: None,
        }
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn in_weapon(mut self, weapon: &str) -> Self {
        self.weapon = Some(weapon.to_string());
        self
    }

    pub fn in_sheet(mut self, sheet: &str) -> Self {
        self.sheet = Some(sheet.to_string());
        self
    }

    pub fn unknown_ammo_code(code: &str) -> Self {
        Self::new(
            "UNKNOWN_AMMO_CODE",
            Severity::Warn,
            format!("unrecognized ammo code {:?}; skipped", code),
        )
    }

    pub fn unknown_barrel(label: &str) -> Self {
        Self::new(
            "UNKNOWN_BARREL",
            Severity::Warn,
            format!("unrecognized barrel label {:?}; rows skipped", label),
        )
    }

    pub fn unknown_tab_color(color: &str) -> Self {
        Self::new(
            "UNKNOWN_TAB_COLOR",
            Severity::Warn,
            format!("tab color {} maps to no category; sheet skipped", color),
        )
    }

    pub fn unknown_layout() -> Self {
        Self::new(
            "UNKNOWN_LAYOUT",
            Severity::Warn,
            "sheet has neither a tab color nor merged category headers; skipped".to_string(),
        )
    }

    pub fn duplicate_configuration(barrel: &str, ammo: &str) -> Self {
        Self::new(
            "DUPLICATE_CONFIGURATION",
            Severity::Warn,
            format!(
                "configuration ({}, {}) seen twice; later one discarded",
                barrel, ammo
            ),
        )
    }

    pub fn duplicate_weapon(name: &str) -> Self {
        Self::new(
            "DUPLICATE_WEAPON",
            Severity::Warn,
            format!("weapon {:?} already extracted; later block discarded", name),
        )
    }

    pub fn missing_column(column: &str) -> Self {
        Self::new(
            "MISSING_COLUMN",
            Severity::Error,
            format!("header {:?} not found; weapon block skipped", column),
        )
    }

    pub fn header_mismatch(column: &str, found: &str) -> Self {
        Self::new(
            "HEADER_MISMATCH",
            Severity::Warn,
            format!("expected header {:?} but found {:?}", column, found),
        )
    }

    pub fn missing_weapon_name() -> Self {
        Self::new(
            "MISSING_WEAPON_NAME",
            Severity::Error,
            "no weapon name found; block skipped".to_string(),
        )
    }

    pub fn non_increasing_range(range: f64, previous: f64) -> Self {
        Self::new(
            "NON_INCREASING_RANGE",
            Severity::Warn,
            format!(
                "dropoff range {} does not follow {}; breakpoint dropped",
                range, previous
            ),
        )
    }

    pub fn missing_ammo_stats(ammo: &str) -> Self {
        Self::new(
            "MISSING_AMMO_STATS",
            Severity::Error,
            format!("no ammo stats for ammo type {:?}", ammo),
        )
    }

    pub fn orphan_ammo_stats(ammo: &str) -> Self {
        Self::new(
            "ORPHAN_AMMO_STATS",
            Severity::Warn,
            format!(
                "ammo stats for {:?} dropped: no configuration uses that ammo type",
                ammo
            ),
        )
    }

    pub fn empty_weapon() -> Self {
        Self::new(
            "EMPTY_WEAPON",
            Severity::Warn,
            "weapon has no configurations".to_string(),
        )
    }

    pub fn synthesized(barrel: &str, ammo: &str) -> Self {
        Self::new(
            "SYNTHESIZED_CONFIGURATION",
            Severity::Info,
            format!("({}, {}) added from the exception table", barrel, ammo),
        )
    }
}

/// Collected diagnostics for one extraction run. Each entry is also logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticLog {
    pub entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn push(&mut self, d: Diagnostic) {
        let location = format!(
            "{}{}{}",
            d.sheet.as_deref().unwrap_or(""),
            d.weapon
                .as_deref()
                .map(|w| format!(" / {}", w))
                .unwrap_or_default(),
            d.row.map(|r| format!(" row {}", r + 1)).unwrap_or_default()
        );
        match d.severity {
            Severity::Info => tracing::debug!("[{}] {}: {}", d.code, location, d.message),
            Severity::Warn => tracing::warn!("[{}] {}: {}", d.code, location, d.message),
            Severity::Error => tracing::error!("[{}] {}: {}", d.code, location, d.message),
        }
        self.entries.push(d);
    }

    pub fn extend(&mut self, other: DiagnosticLog) {
        self.entries.extend(other.entries);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_attach_location() {
        let d = Diagnostic::duplicate_configuration("Factory", "Standard")
            .in_sheet("M5A3")
            .in_weapon("M5A3")
            .at_row(7);
        assert_eq!(d.code, "DUPLICATE_CONFIGURATION");
        assert_eq!(d.severity, Severity::Warn);
        assert_eq!(d.row, Some(7));
        assert_eq!(d.sheet.as_deref(), Some("M5A3"));
    }

    #[test]
    fn log_counts_by_severity_and_code() {
        let mut log = DiagnosticLog::default();
        log.push(Diagnostic::missing_column("Damage"));
        log.push(Diagnostic::unknown_barrel("???"));
        log.push(Diagnostic::unknown_barrel("!!!"));
        assert_eq!(log.count(Severity::Error), 1);
        assert_eq!(log.count(Severity::Warn), 2);
        assert_eq!(log.with_code("UNKNOWN_BARREL").count(), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn serializes_without_absent_location() {
        let json = serde_json::to_string(&Diagnostic::empty_weapon()).unwrap();
        assert!(!json.contains("sheet"));
        assert!(json.contains("EMPTY_WEAPON"));
    }
}
