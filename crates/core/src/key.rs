use serde::{Deserialize, Serialize};

use crate::cell::{CellValue, Row};

/// Identity of a data row: the value in its first column.
///
/// Keys compare strictly. Text `"1"` and Number `1` are different keys, and
/// text comparison is exact (no trimming, no case folding). An empty first
/// cell has no key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(CellValue);

impl RowKey {
    /// Key for a cell value; `None` for empty cells.
    pub fn from_cell(value: &CellValue) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(RowKey(value.clone()))
        }
    }

    /// Key of a row (its column 0).
    pub fn of_row(row: &Row) -> Option<Self> {
        Self::from_cell(row.cell(0))
    }

    pub fn text(s: impl Into<String>) -> Self {
        RowKey(CellValue::Text(s.into()))
    }

    pub fn number(n: f64) -> Self {
        RowKey(CellValue::Number(n))
    }

    pub fn value(&self) -> &CellValue {
        &self.0
    }

    /// True if `row`'s first column holds exactly this key.
    pub fn matches(&self, row: &Row) -> bool {
        row.cell(0) == &self.0
    }
}

impl std::fmt::Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
