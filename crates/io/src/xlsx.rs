// Excel workbook import (xlsx, xlsm, xlsb, xls, ods)
//
// One-way decode into sheet tables: values only, no formulas or formatting.
// Formula cells contribute their cached result.

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use budgetgrid_core::cell::{CellValue, Row};
use budgetgrid_engine::sheet::SheetTable;
use budgetgrid_engine::workbook::Workbook;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Timelike;

use crate::error::ImportError;

/// Maximum number of cells to import (prevents DoS from huge files)
const MAX_CELLS: usize = 5_000_000;

/// Maximum dimensions for a sheet
const MAX_ROWS: usize = 65536;
const MAX_COLS: usize = 256;

/// Per-sheet import statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetStats {
    pub name: String,
    /// Rows kept, header included
    pub rows: usize,
    /// Widest kept row
    pub cols: usize,
    pub cells_imported: usize,
    pub dates_imported: usize,
    pub truncated_rows: usize,
    pub truncated_cols: usize,
}

impl SheetStats {
    /// Data rows (header excluded).
    pub fn data_rows(&self) -> usize {
        self.rows.saturating_sub(1)
    }
}

/// Result of a workbook import
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    /// Per-sheet statistics, in workbook order
    pub sheet_stats: Vec<SheetStats>,
    pub sheets_imported: usize,
    pub cells_imported: usize,
    /// Whether any cap was hit
    pub truncated: bool,
    /// Actionable warnings (not boilerplate)
    pub warnings: Vec<String>,
    pub import_duration_ms: u128,
}

impl ImportReport {
    /// Returns a summary message suitable for display
    pub fn summary(&self) -> String {
        format!(
            "{} sheet{} · {} cells",
            self.sheets_imported,
            if self.sheets_imported == 1 { "" } else { "s" },
            self.cells_imported
        )
    }

    pub fn has_warnings(&self) -> bool {
        self.truncated || !self.warnings.is_empty()
    }

    /// Single-line warning for a status bar
    pub fn warning_summary(&self) -> Option<String> {
        if !self.has_warnings() {
            return None;
        }
        if self.warnings.len() == 1 {
            return self.warnings.first().cloned();
        }
        Some(format!("{} import warnings", self.warnings.len()))
    }
}

/// Decode workbook bytes into sheet tables.
pub fn parse(bytes: &[u8]) -> Result<(Workbook, ImportReport), ImportError> {
    if bytes.is_empty() {
        return Err(ImportError::Empty);
    }
    let start_time = Instant::now();

    let mut source = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Unrecognized(e.to_string()))?;

    let sheet_names: Vec<String> = source.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(ImportError::NoSheets);
    }

    let mut report = ImportReport::default();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    let mut total_cells = 0;
    let mut hit_cell_limit = false;

    for sheet_name in &sheet_names {
        let range = source.worksheet_range(sheet_name).map_err(|e| ImportError::Sheet {
            name: sheet_name.clone(),
            reason: e.to_string(),
        })?;

        let (height, width) = range.get_size();
        let mut stats = SheetStats {
            name: sheet_name.clone(),
            ..Default::default()
        };

        // Cap dimensions to our limits
        let effective_rows = height.min(MAX_ROWS);
        let effective_cols = width.min(MAX_COLS);
        if height > MAX_ROWS || width > MAX_COLS {
            stats.truncated_rows = height.saturating_sub(MAX_ROWS);
            stats.truncated_cols = width.saturating_sub(MAX_COLS);
            report.truncated = true;
            report.warnings.push(format!(
                "Sheet '{}' truncated from {}x{} to {}x{}",
                sheet_name, height, width, effective_rows, effective_cols
            ));
        }

        let mut rows: Vec<Row> = Vec::with_capacity(effective_rows);
        if !hit_cell_limit {
            for source_row in range.rows().take(effective_rows) {
                let mut cells = Vec::with_capacity(effective_cols);
                for cell in source_row.iter().take(effective_cols) {
                    if total_cells >= MAX_CELLS {
                        if !hit_cell_limit {
                            hit_cell_limit = true;
                            report.truncated = true;
                            report.warnings.push(format!(
                                "Import stopped at {} cells (limit reached)",
                                MAX_CELLS
                            ));
                        }
                        break;
                    }
                    let value = convert_cell(cell, &mut stats);
                    if !value.is_empty() {
                        stats.cells_imported += 1;
                        total_cells += 1;
                    }
                    cells.push(value);
                }

                let mut row = Row::new(cells);
                row.trim_trailing_empty();
                stats.cols = stats.cols.max(row.len());
                rows.push(row);

                if hit_cell_limit {
                    break;
                }
            }
        }

        stats.rows = rows.len();
        log::debug!(
            "sheet '{}': {} rows x {} cols, {} cells",
            sheet_name,
            stats.rows,
            stats.cols,
            stats.cells_imported
        );
        report.cells_imported += stats.cells_imported;
        report.sheets_imported += 1;
        report.sheet_stats.push(stats);
        sheets.push(SheetTable::new(sheet_name.clone(), rows));
    }

    for warning in &report.warnings {
        log::warn!("{}", warning);
    }
    report.import_duration_ms = start_time.elapsed().as_millis();
    log::info!("imported {} in {} ms", report.summary(), report.import_duration_ms);

    Ok((Workbook::new(sheets), report))
}

/// Read a workbook file from disk and decode it.
pub fn import_file(path: &Path) -> Result<(Workbook, ImportReport), ImportError> {
    let bytes = std::fs::read(path)?;
    parse(&bytes)
}

fn convert_cell(cell: &Data, stats: &mut SheetStats) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::DateTime(dt) => {
            stats.dates_imported += 1;
            match dt.as_datetime() {
                Some(value) if dt.is_datetime() => {
                    let text = if value.time().num_seconds_from_midnight() == 0 {
                        value.format("%Y-%m-%d").to_string()
                    } else {
                        value.format("%Y-%m-%d %H:%M:%S").to_string()
                    };
                    CellValue::Text(text)
                }
                // Durations and serials outside the calendar keep the raw serial
                _ => CellValue::Number(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
