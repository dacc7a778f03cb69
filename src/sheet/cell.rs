//! Cell value type for exported sheets.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

/// One grid cell: its value plus the background color the host reported.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub background: Option<String>,
}

impl Cell {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(s.into()),
            background: None,
        }
    }

    pub fn number(n: f64) -> Self {
        Self {
            value: CellValue::Number(n),
            background: None,
        }
    }

    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            CellValue::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Display text of the cell. Numbers render without a trailing `.0`.
    pub fn as_text(&self) -> String {
        match &self.value {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match &self.value {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Wire shape of a cell: a bare scalar or `{ value, background }`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum RawCell {
    Number(f64),
    Text(String),
    Styled {
        #[serde(default)]
        value: Option<RawScalar>,
        #[serde(default)]
        background: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub(crate) enum RawScalar {
    Number(f64),
    Text(String),
}

impl From<Option<RawCell>> for Cell {
    fn from(raw: Option<RawCell>) -> Self {
        match raw {
            None => Cell::empty(),
            Some(RawCell::Number(n)) => Cell::number(n),
            Some(RawCell::Text(s)) => Cell::text(s),
            Some(RawCell::Styled { value, background }) => Cell {
                value: match value {
                    Some(RawScalar::Number(n)) => CellValue::Number(n),
                    Some(RawScalar::Text(s)) => CellValue::Text(s),
                    None => CellValue::Empty,
                },
                background: background.map(|b| b.trim().to_lowercase()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_text_drops_integral_fraction() {
        assert_eq!(Cell::number(600.0).as_text(), "600");
        assert_eq!(Cell::number(22.5).as_text(), "22.5");
    }

    #[test]
    fn whitespace_text_is_blank() {
        assert!(Cell::text("   ").is_blank());
        assert!(Cell::empty().is_blank());
        assert!(!Cell::number(0.0).is_blank());
    }

    #[test]
    fn styled_raw_cell_lowercases_background() {
        let raw: Option<RawCell> =
            serde_json::from_str(r##"{"value": "M5A3", "background": "#00000F"}"##).unwrap();
        let cell = Cell::from(raw);
        assert_eq!(cell.as_text(), "M5A3");
        assert_eq!(cell.background.as_deref(), Some("#00000f"));
    }
}
