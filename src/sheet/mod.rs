//! Exported spreadsheet model: cell grids, merged ranges and tab colors.
//! The host application exports each sheet as JSON; nothing here evaluates formulas.

mod cell;

pub use cell::{Cell, CellValue};

use crate::config::{MAX_SHEETS, MAX_WORKBOOK_FILE_BYTES};
use cell::RawCell;
use serde::{Deserialize, Serialize};

/// A rectangle of merged cells. Zero-based, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRange {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl MergedRange {
    pub fn new(start_row: usize, end_row: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            start_row,
            end_row,
            start_col,
            end_col,
        }
    }

    pub fn width(&self) -> usize {
        self.end_col.saturating_sub(self.start_col) + 1
    }

    pub fn height(&self) -> usize {
        self.end_row.saturating_sub(self.start_row) + 1
    }

    pub fn contains_col(&self, col: usize) -> bool {
        (self.start_col..=self.end_col).contains(&col)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub tab_color: Option<String>,
    rows: Vec<Vec<Cell>>,
    pub merges: Vec<MergedRange>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSheet {
    name: String,
    #[serde(default)]
    tab_color: Option<String>,
    #[serde(default)]
    rows: Vec<Vec<Option<RawCell>>>,
    #[serde(default)]
    merges: Vec<MergedRange>,
}

impl From<RawSheet> for Sheet {
    fn from(raw: RawSheet) -> Self {
        let rows = raw
            .rows
            .into_iter()
            .map(|r| r.into_iter().map(Cell::from).collect())
            .collect();
        Sheet {
            name: raw.name,
            tab_color: raw
                .tab_color
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty()),
            rows,
            merges: raw.merges,
        }
    }
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Sheet {
            name: name.into(),
            tab_color: None,
            rows,
            merges: Vec::new(),
        }
    }

    pub fn with_tab_color(mut self, color: &str) -> Self {
        self.tab_color = Some(color.trim().to_lowercase());
        self
    }

    pub fn with_merges(mut self, merges: Vec<MergedRange>) -> Self {
        self.merges = merges;
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell at (row, col); ragged rows read as blank past their end.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.get(col)
    }

    /// Trimmed text at (row, col), empty when absent.
    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col)
            .map(|c| c.as_text().trim().to_string())
            .unwrap_or_default()
    }

    pub fn background(&self, row: usize, col: usize) -> Option<&str> {
        self.cell(row, col)?.background.as_deref()
    }

    pub fn is_blank(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).map(Cell::is_blank).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

#[derive(Deserialize)]
struct RawWorkbook {
    sheets: Vec<RawSheet>,
}

#[derive(Debug)]
pub enum LoadError {
    InputTooLarge { bytes: usize },
    TooManySheets { count: usize },
    Json(serde_json::Error),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::InputTooLarge { bytes } => write!(
                f,
                "input exceeds maximum size: {} bytes (max {})",
                bytes, MAX_WORKBOOK_FILE_BYTES
            ),
            LoadError::TooManySheets { count } => {
                write!(f, "workbook has {} sheets (max {})", count, MAX_SHEETS)
            }
            LoadError::Json(e) => write!(f, "invalid sheet export: {}", e),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Json(e)
    }
}

/// Parse a whole-workbook export `{ "sheets": [...] }`.
pub fn parse_workbook(content: &str) -> Result<Workbook, LoadError> {
    if content.len() > MAX_WORKBOOK_FILE_BYTES {
        return Err(LoadError::InputTooLarge {
            bytes: content.len(),
        });
    }
    let raw: RawWorkbook = serde_json::from_str(content)?;
    if raw.sheets.len() > MAX_SHEETS {
        return Err(LoadError::TooManySheets {
            count: raw.sheets.len(),
        });
    }
    Ok(Workbook {
        sheets: raw.sheets.into_iter().map(Sheet::from).collect(),
    })
}

/// Parse a single-sheet export.
pub fn parse_sheet(content: &str) -> Result<Sheet, LoadError> {
    if content.len() > MAX_WORKBOOK_FILE_BYTES {
        return Err(LoadError::InputTooLarge {
            bytes: content.len(),
        });
    }
    let raw: RawSheet = serde_json::from_str(content)?;
    Ok(Sheet::from(raw))
}

/// Parse either export shape: a workbook object or a lone sheet.
pub fn parse_export(content: &str) -> Result<Workbook, LoadError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.get("sheets").is_some() {
        parse_workbook(content)
    } else {
        Ok(Workbook {
            sheets: vec![parse_sheet(content)?],
        })
    }
}
