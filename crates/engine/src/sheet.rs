use budgetgrid_core::cell::Row;
use serde::{Deserialize, Serialize};

static EMPTY_ROW: Row = Row::EMPTY;

/// One sheet of a workbook: a header row followed by data rows.
///
/// Row 0 is the header. Data rows keep the order they had in the source file
/// and may be shorter than the header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SheetTable {
    pub name: String,
    rows: Vec<Row>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self { name: name.into(), rows }
    }

    /// A sheet with no header and no data.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Header row; empty for a sheet with no rows at all.
    pub fn header(&self) -> &Row {
        self.rows.first().unwrap_or(&EMPTY_ROW)
    }

    /// Header labels as display strings.
    pub fn headers(&self) -> Vec<String> {
        self.header().cells().iter().map(|c| c.display_text()).collect()
    }

    /// Number of header columns.
    pub fn column_count(&self) -> usize {
        self.header().len()
    }

    /// Data rows (everything after the header).
    pub fn data_rows(&self) -> &[Row] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.data_rows().len()
    }

    /// All rows including the header.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetgrid_core::row;

    #[test]
    fn header_and_data_split() {
        let sheet = SheetTable::new(
            "Presupuesto_General",
            vec![
                row!["Code", "Description", "Total"],
                row!["A1", "Cement", 100.0],
                row!["A2", "Sand", 50.0],
            ],
        );
        assert_eq!(sheet.headers(), vec!["Code", "Description", "Total"]);
        assert_eq!(sheet.column_count(), 3);
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.data_rows()[1].text(1), "Sand");
    }

    #[test]
    fn empty_sheet_has_no_header_or_rows() {
        let sheet = SheetTable::empty("Asignación_Materiales");
        assert!(sheet.is_empty());
        assert!(sheet.headers().is_empty());
        assert!(sheet.data_rows().is_empty());
    }

    #[test]
    fn header_only_sheet_has_no_data() {
        let sheet = SheetTable::new("x", vec![row!["Code"]]);
        assert_eq!(sheet.column_count(), 1);
        assert_eq!(sheet.row_count(), 0);
    }
}
