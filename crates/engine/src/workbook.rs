use serde::{Deserialize, Serialize};

use crate::sheet::SheetTable;

/// A parsed workbook: named sheet tables in source order.
///
/// Built once per successful import and replaced wholesale on re-import; it
/// is never edited in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workbook {
    sheets: Vec<SheetTable>,
}

impl Workbook {
    /// Build a workbook from sheets in source order.
    ///
    /// Sheet names are unique; if a name repeats, the first sheet with that
    /// name wins and later duplicates are dropped.
    pub fn new(sheets: Vec<SheetTable>) -> Self {
        let mut unique: Vec<SheetTable> = Vec::with_capacity(sheets.len());
        for sheet in sheets {
            if unique.iter().any(|s| s.name == sheet.name) {
                log::warn!("duplicate sheet name '{}' ignored", sheet.name);
                continue;
            }
            unique.push(sheet);
        }
        Self { sheets: unique }
    }

    /// Get a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    pub fn sheets(&self) -> &[SheetTable] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}
