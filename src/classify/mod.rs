//! Cell classifiers: map raw sheet text to ammo names, barrel names,
//! categories and numbers.
//!
//! All lookup tables are immutable statics built on first use.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Ammo code -> display name, as used in the dropoff tables.
const AMMO_CODES: &[(&str, &str)] = &[
    ("ST", "Standard"),
    ("CC", "Close Combat"),
    ("HP", "High Power"),
    ("SS", "Subsonic"),
    ("AP", "Armor Piercing"),
    ("HV", "High Velocity"),
    ("FL", "Flechette"),
    ("B01", "#01 Buckshot"),
    ("B4", "#4 Buckshot"),
    ("SL", "Slug"),
    ("EB", "Explosive Bolt"),
    ("TB", "Tranquilizer Bolt"),
    ("HE", "High Explosive"),
    ("RR", "Rorsch Round"),
];

/// Suffix markers in precedence order, with the label appended to the base name.
const AMMO_SUFFIXES: &[(&str, &str)] = &[
    ("E", "Extended"),
    ("BF", "Beltfed"),
    ("D", "Drum"),
    (" (BF/FA)", "(Burst/Auto)"),
    (" (SF)", "(Single)"),
];

/// Cells with this text are commentary from the sheet maintainer.
const ANNOTATION_MARKER: &str = "My two cents:";

/// Ammo types whose capacity rows carry an extra pellet-count column.
const SHOTGUN_AMMO: &[&str] = &[
    "Flechette",
    "#01 Buckshot",
    "#00 Buckshot",
    "#4 Buckshot",
    "Slug",
];

/// Barrel patterns per canonical name. Order matters: first match wins.
const BARREL_PATTERNS: &[(&str, &[&str])] = &[
    ("Factory", &[r"(?i)factory", r"(?i)^standard"]),
    ("Extended", &[r"(?i)extended", r"(?i)long barrel"]),
    ("Shortened", &[r"(?i)shortened", r"(?i)short barrel", r"(?i)\bcqb\b"]),
    ("GAR45", &[r"(?i)gar-?45"]),
    ("Spook Y", &[r"(?i)spook"]),
    ("NVK-SHH", &[r"(?i)nvk-?shh"]),
    ("NVK-BOX", &[r"(?i)nvk-?box"]),
    ("6KU", &[r"(?i)6ku"]),
    ("PB", &[r"\bPB\b"]),
    ("Type 4", &[r"(?i)type\s*4"]),
    ("Heavy", &[r"(?i)heavy"]),
];

/// Tab color (lowercase hex) -> category. `None` marks info tabs that are skipped.
const TAB_COLORS: &[(&str, Option<&str>)] = &[
    ("#ff0000", Some("Assault Rifles")),
    ("#ff9900", Some("SMGs")),
    ("#ffff00", Some("LMGs")),
    ("#00ff00", Some("DMRs")),
    ("#00ffff", Some("Bolt Action")),
    ("#4a86e8", Some("Shotguns")),
    ("#9900ff", Some("Sidearms")),
    ("#ff00ff", Some("Crossbows")),
    ("#000000", None),
    ("#666666", None),
];

static AMMO_TABLE: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| AMMO_CODES.iter().copied().collect());

static BARREL_TABLE: LazyLock<Vec<(&'static str, Vec<Regex>)>> = LazyLock::new(|| {
    BARREL_PATTERNS
        .iter()
        .map(|(name, patterns)| (*name, patterns.iter().map(|p| compile(p)).collect()))
        .collect()
});

static LEADING_INT: LazyLock<Regex> = LazyLock::new(|| compile(r"\d+(?: \d+)*"));
static LEADING_FLOAT: LazyLock<Regex> = LazyLock::new(|| compile(r"\d+(?: \d+)*(?:\.\d+)?"));
static RELOAD_EMPTY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(\d+(?:[.,]\d+)?)\s*s?\s*\(empty\)"));
static RELOAD_TACTICAL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(\d+(?:[.,]\d+)?)\s*s?\s*\(tactical\)"));
static RELOAD_REST: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(\d+(?:[.,]\d+)?)\s*s?\s*\(rest\)"));

// Only called with the literals above.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Result of classifying one `|`-separated ammo cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmmoClassification {
    pub names: Vec<String>,
    /// Codes that matched nothing (annotation cells excluded).
    pub unresolved: Vec<String>,
}

/// Classify an ammo cell such as `"ST|CC"` or `"STE"`. Order is preserved and
/// duplicates are kept; unresolved codes are reported, annotation text is dropped silently.
pub fn classify_ammo_type(cell: &str) -> AmmoClassification {
    let mut out = AmmoClassification::default();
    for code in cell.split('|') {
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        match resolve_ammo_code(code) {
            Some(name) => out.names.push(name),
            None if code.contains(ANNOTATION_MARKER) => {}
            None => {
                tracing::debug!("unrecognized ammo code {:?}", code);
                out.unresolved.push(code.to_string());
            }
        }
    }
    out
}

fn resolve_ammo_code(code: &str) -> Option<String> {
    if let Some(name) = AMMO_TABLE.get(code) {
        return Some((*name).to_string());
    }
    for (suffix, label) in AMMO_SUFFIXES {
        if let Some(base) = code.strip_suffix(suffix) {
            if let Some(name) = AMMO_TABLE.get(base.trim_end()) {
                return Some(format!("{} {}", name, label));
            }
        }
    }
    None
}

/// Canonical barrel name for a label, or `None` when no pattern matches.
pub fn classify_barrel_type(label: &str) -> Option<&'static str> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    for (name, patterns) in BARREL_TABLE.iter() {
        if patterns.iter().any(|re| re.is_match(label)) {
            return Some(*name);
        }
    }
    tracing::debug!("unrecognized barrel label {:?}", label);
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCategory {
    Category(&'static str),
    Ignore,
    Unknown,
}

pub fn classify_category(tab_color: &str) -> TabCategory {
    let key = tab_color.trim().to_lowercase();
    match TAB_COLORS.iter().find(|(c, _)| *c == key) {
        Some(&(_, Some(name))) => TabCategory::Category(name),
        Some(&(_, None)) => TabCategory::Ignore,
        None => TabCategory::Unknown,
    }
}

/// Capacity tables label buckshot "#00" while the game calls it "#01".
pub fn canonical_ammo_stat_name(name: &str) -> String {
    let name = name.trim();
    match name.strip_prefix("#00 Buckshot") {
        Some(rest) => format!("#01 Buckshot{}", rest),
        None => name.to_string(),
    }
}

pub fn is_shotgun_ammo(name: &str) -> bool {
    let name = name.trim();
    SHOTGUN_AMMO.iter().any(|s| name.starts_with(s))
}

/// First digit run as an integer. Spaces inside the run are thousands separators.
pub fn parse_leading_int(cell: &str) -> Option<i64> {
    let m = LEADING_INT.find(cell)?;
    m.as_str().replace(' ', "").parse().ok()
}

/// First number as a float; a comma is read as the decimal separator.
pub fn parse_leading_float(cell: &str) -> Option<f64> {
    let normalized = cell.replace(',', ".");
    let m = LEADING_FLOAT.find(&normalized)?;
    m.as_str().replace(' ', "").parse().ok()
}

/// Reload cell such as `"2.8s (empty) / 2.1s (tactical)"` -> (empty, tactical).
/// `(rest)` stands in for `(tactical)` where the sheet mislabels it.
pub fn parse_reload(cell: &str) -> (Option<f64>, Option<f64>) {
    let empty = capture_seconds(&RELOAD_EMPTY, cell);
    let tactical = capture_seconds(&RELOAD_TACTICAL, cell)
        .or_else(|| capture_seconds(&RELOAD_REST, cell));
    (empty, tactical)
}

fn capture_seconds(re: &Regex, cell: &str) -> Option<f64> {
    let m = re.captures(cell)?.get(1)?;
    parse_leading_float(m.as_str())
}
