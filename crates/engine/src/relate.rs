//! Cross-sheet relational filtering.
//!
//! Dependent sheets reference master rows through their first column. Given
//! the selected master key, pick every dependent data row that carries it.

use budgetgrid_core::cell::Row;
use budgetgrid_core::key::RowKey;

use crate::sheet::SheetTable;

/// Data rows of `sheet` whose column 0 equals `key` exactly, in sheet order.
///
/// No key or no sheet yields an empty result, never an error. The header row
/// is never returned.
pub fn filter_by_key<'a>(sheet: Option<&'a SheetTable>, key: Option<&RowKey>) -> Vec<&'a Row> {
    let (Some(sheet), Some(key)) = (sheet, key) else {
        return Vec::new();
    };
    sheet.data_rows().iter().filter(|row| key.matches(row)).collect()
}
