use serde::{Deserialize, Serialize};

/// A single decoded cell.
///
/// Workbook cells arrive as text, numbers, or nothing at all. Everything
/// downstream (filtering, sorting, key matching) works off this tag instead of
/// guessing types from strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Display string for the cell.
    ///
    /// Integral numbers print without a fractional part (`100`, not `100.0`).
    /// Empty cells print as the empty string.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
        }
    }

    /// Numeric reading of the cell, if it has one.
    ///
    /// Numbers are returned as-is when finite. Text is trimmed and parsed;
    /// anything that does not parse to a finite value (including `inf`/`NaN`
    /// spellings) is not numeric. Empty cells are never numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => n.is_finite().then_some(*n),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_text())
    }
}

/// Format a number the way a grid shows it: integers without decimals.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One row of a sheet table, as stored. Rows may be ragged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    /// A row with no cells.
    pub const EMPTY: Row = Row { cells: Vec::new() };

    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at `col`; cells past the end of a short row read as empty.
    pub fn cell(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&EMPTY_CELL)
    }

    /// Display text of the cell at `col`.
    pub fn text(&self, col: usize) -> String {
        self.cell(col).display_text()
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Number of stored cells (not padded to the header width).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Drop trailing empty cells so the row ends at its last value.
    pub fn trim_trailing_empty(&mut self) {
        while matches!(self.cells.last(), Some(CellValue::Empty)) {
            self.cells.pop();
        }
    }
}

impl From<Vec<CellValue>> for Row {
    fn from(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }
}

impl FromIterator<CellValue> for Row {
    fn from_iter<I: IntoIterator<Item = CellValue>>(iter: I) -> Self {
        Self { cells: iter.into_iter().collect() }
    }
}

/// Build a row from literals: `row!["A1", "Cement", 100.0]`.
#[macro_export]
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        $crate::cell::Row::new(vec![$($crate::cell::CellValue::from($cell)),*])
    };
}
