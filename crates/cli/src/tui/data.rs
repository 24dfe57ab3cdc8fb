use budgetgrid_core::cell::{CellValue, Row};
use budgetgrid_engine::filter::{EmptyResultNotice, GridPage, GridViewState};

use crate::util;

/// Display-ready snapshot of one grid page.
pub struct GridData {
    /// Header labels, with the sort arrow appended to the sorted column
    pub col_names: Vec<String>,
    /// Visible rows as display strings, padded to the header width
    pub rows: Vec<Vec<String>>,
    /// Per column: right-align (every non-empty visible cell is numeric)
    pub numeric: Vec<bool>,
    /// Pre-computed column widths (display columns, clamped to [3, 40])
    pub col_widths: Vec<usize>,
    /// Active filters as (column label, text)
    pub filters: Vec<(String, String)>,
    pub total_filtered: usize,
    pub page: usize,
    pub page_count: usize,
    /// 1-based position of the first visible row in the filtered rows
    pub first_position: Option<usize>,
    pub notice: Option<EmptyResultNotice>,
}

impl GridData {
    pub fn from_page(headers: &Row, page: &GridPage<'_>, view: &GridViewState) -> Self {
        let num_cols = headers.len();
        let col_names: Vec<String> = (0..num_cols)
            .map(|c| {
                let label = headers.text(c);
                match view.sort_indicator(c) {
                    "" => label,
                    arrow => format!("{} {}", label, arrow),
                }
            })
            .collect();

        // Only header columns are part of the grid
        let rows: Vec<Vec<String>> = page
            .rows
            .iter()
            .map(|row| (0..num_cols).map(|c| row.text(c)).collect())
            .collect();

        let numeric = (0..num_cols)
            .map(|c| {
                let mut cells = page.rows.iter().map(|r| r.cell(c)).filter(|v| !v.is_empty());
                let mut any = false;
                let all = cells.all(|v| {
                    any = true;
                    matches!(v, CellValue::Number(_)) || v.as_number().is_some()
                });
                any && all
            })
            .collect();

        let filters = view
            .filters()
            .filter(|(c, _)| *c < num_cols)
            .map(|(c, f)| (headers.text(c), f.value.clone()))
            .collect();

        let col_widths = Self::compute_widths(&col_names, &rows, num_cols);
        Self {
            col_names,
            rows,
            numeric,
            col_widths,
            filters,
            total_filtered: page.total_filtered,
            page: page.page,
            page_count: page.page_count(),
            first_position: page.first_position(),
            notice: page.notice,
        }
    }

    /// Pad a cell to its column width, numbers flush right.
    pub fn format_cell(&self, col: usize, value: &str, width: usize) -> String {
        if self.numeric.get(col).copied().unwrap_or(false) {
            util::pad_left(value, width)
        } else {
            util::pad_right(value, width)
        }
    }

    /// "page 2/3 · rows 6-10 of 12"
    pub fn page_label(&self) -> String {
        match self.first_position {
            Some(first) => format!(
                "page {}/{} · rows {}-{} of {}",
                self.page,
                self.page_count,
                first,
                first + self.rows.len() - 1,
                self.total_filtered
            ),
            None => format!("page {}/{} · {} rows", self.page, self.page_count, self.total_filtered),
        }
    }

    fn compute_widths(col_names: &[String], rows: &[Vec<String>], num_cols: usize) -> Vec<usize> {
        (0..num_cols)
            .map(|c| {
                let header_w = col_names.get(c).map(|s| util::display_width(s)).unwrap_or(0);
                let max_cell = rows
                    .iter()
                    .map(|row| row.get(c).map(|s| util::display_width(s)).unwrap_or(0))
                    .max()
                    .unwrap_or(0);
                header_w.max(max_cell).clamp(3, 40)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetgrid_core::row;
    use budgetgrid_engine::filter::present;

    #[test]
    fn from_page_formats_cells_and_headers() {
        let headers = row!["Code", "Description", "Total"];
        let rows = vec![row!["A1", "Cement"], row!["A2", "Sand", 50.5]];
        let mut view = GridViewState::default();
        view.toggle_sort(2);
        view.set_filter(1, "e");
        let page = present(&headers, &rows, &view);
        let data = GridData::from_page(&headers, &page, &view);

        assert_eq!(data.col_names, vec!["Code", "Description", "Total ↑"]);
        assert_eq!(data.rows, vec![vec!["A1", "Cement", ""]]);
        assert_eq!(data.filters, vec![("Description".to_string(), "e".to_string())]);
        assert_eq!(data.numeric, vec![false, false, false]);
        assert_eq!(data.col_widths, vec![4, 11, 7]);
    }

    #[test]
    fn numeric_columns_align_right() {
        let headers = row!["Code", "Total"];
        let rows = vec![row!["A1", 100.0], row!["A2", "7"]];
        let view = GridViewState::default();
        let page = present(&headers, &rows, &view);
        let data = GridData::from_page(&headers, &page, &view);

        assert_eq!(data.numeric, vec![false, true]);
        assert_eq!(data.format_cell(1, "7", 5), "    7");
        assert_eq!(data.format_cell(0, "A2", 4), "A2  ");
    }

    #[test]
    fn page_label_shows_window() {
        let headers = row!["N"];
        let rows: Vec<Row> = (1..=12).map(|i| row![i as f64]).collect();
        let mut view = GridViewState::new(5);
        view.set_page(2);
        let page = present(&headers, &rows, &view);
        let data = GridData::from_page(&headers, &page, &view);
        assert_eq!(data.page_label(), "page 2/3 · rows 6-10 of 12");
    }
}
