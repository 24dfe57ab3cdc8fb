// Printable report export (xlsx)
//
// Lays the report region out on a single worksheet: title, selected item,
// then one block per grid. Page setup comes from ExportOptions so the file
// prints on one portrait A4 sheet by default.

use std::path::{Path, PathBuf};

use budgetgrid_core::cell::CellValue;
use budgetgrid_engine::report::{
    ExportError, ExportOptions, ExportReceipt, ExportSurface, GridSnapshot, Orientation,
    PageFormat, ReportRegion,
};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook as XlsxWorkbook, Worksheet, XlsxError};

const REPORT_SHEET: &str = "Reporte";

/// Paper size codes from the xlsx page setup table.
const PAPER_LETTER: u8 = 1;
const PAPER_A4: u8 = 9;

const MAX_COLUMN_WIDTH: usize = 60;
const MIN_COLUMN_WIDTH: usize = 8;

/// Writes the report into `out_dir/<options.file_name>`.
#[derive(Debug, Clone)]
pub struct XlsxReportSurface {
    out_dir: PathBuf,
}

impl XlsxReportSurface {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

impl ExportSurface for XlsxReportSurface {
    fn export(
        &mut self,
        region: &ReportRegion,
        options: &ExportOptions,
    ) -> Result<ExportReceipt, ExportError> {
        validate(options)?;
        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(&options.file_name);

        let mut workbook = XlsxWorkbook::new();
        let worksheet = workbook.add_worksheet();
        write_report(worksheet, region, options).map_err(surface_error)?;
        workbook.save(&path).map_err(surface_error)?;

        Ok(ExportReceipt {
            path,
            grids: region.grids.len(),
            rows: region.row_count(),
        })
    }
}

fn surface_error(e: XlsxError) -> ExportError {
    ExportError::Surface(e.to_string())
}

fn validate(options: &ExportOptions) -> Result<(), ExportError> {
    let name = options.file_name.trim();
    if name.is_empty() {
        return Err(ExportError::InvalidOptions("file name is empty".into()));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ExportError::InvalidOptions(format!(
            "file name '{}' must not contain a path separator",
            name
        )));
    }
    if !(options.margin.is_finite() && options.margin >= 0.0) {
        return Err(ExportError::InvalidOptions(format!("margin {} is not valid", options.margin)));
    }
    if !(options.scale.is_finite() && options.scale > 0.0) {
        return Err(ExportError::InvalidOptions(format!("scale {} is not valid", options.scale)));
    }
    Ok(())
}

/// Render scale 2.0 prints at 100%.
fn print_scale(scale: f64) -> u16 {
    (scale * 50.0).round().clamp(10.0, 400.0) as u16
}

fn write_report(
    worksheet: &mut Worksheet,
    region: &ReportRegion,
    options: &ExportOptions,
) -> Result<(), XlsxError> {
    worksheet.set_name(REPORT_SHEET)?;
    worksheet.set_paper_size(match options.page_format {
        PageFormat::A4 => PAPER_A4,
        PageFormat::Letter => PAPER_LETTER,
    });
    match options.orientation {
        Orientation::Portrait => worksheet.set_portrait(),
        Orientation::Landscape => worksheet.set_landscape(),
    };
    let m = options.margin;
    worksheet.set_margins(m, m, m, m, m / 2.0, m / 2.0);
    worksheet.set_print_scale(print_scale(options.scale));

    let title_format = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_font_color(Color::RGB(0x60091A));
    let grid_title_format = Format::new().set_bold().set_font_size(12);
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border_bottom(FormatBorder::Thin);
    let notice_format = Format::new().set_italic().set_font_color(Color::RGB(0x555555));

    let mut widths: Vec<usize> = Vec::new();
    let mut row: u32 = 0;

    worksheet.write_string_with_format(row, 0, &region.title, &title_format)?;
    row += 1;
    if let Some(key) = &region.selected_key {
        worksheet.write_string(row, 0, format!("Item: {}", key))?;
        row += 1;
    }

    for grid in &region.grids {
        row += 1;
        worksheet.write_string_with_format(row, 0, &grid.title, &grid_title_format)?;
        row += 1;
        row = write_grid(worksheet, grid, row, &header_format, &notice_format, &mut widths)?;
    }

    for (col, width) in widths.iter().enumerate() {
        let width = (*width).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH) + 2;
        worksheet.set_column_width(col as u16, width as f64)?;
    }
    Ok(())
}

/// Writes header and rows starting at `row`; returns the next free row.
fn write_grid(
    worksheet: &mut Worksheet,
    grid: &GridSnapshot,
    mut row: u32,
    header_format: &Format,
    notice_format: &Format,
    widths: &mut Vec<usize>,
) -> Result<u32, XlsxError> {
    let mut track = |col: usize, text: &str| {
        if widths.len() <= col {
            widths.resize(col + 1, 0);
        }
        widths[col] = widths[col].max(text.chars().count());
    };

    for (col, header) in grid.headers.iter().enumerate() {
        worksheet.write_string_with_format(row, col as u16, header, header_format)?;
        track(col, header);
    }
    row += 1;

    if let Some(notice) = grid.notice {
        worksheet.write_string_with_format(row, 0, notice.message(), notice_format)?;
        return Ok(row + 1);
    }

    for data in &grid.rows {
        // Cells beyond the header are not part of the grid
        for (col, cell) in data.cells().iter().enumerate().take(grid.headers.len()) {
            match cell {
                CellValue::Empty => {}
                CellValue::Number(n) => {
                    worksheet.write_number(row, col as u16, *n)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(row, col as u16, s)?;
                }
            }
            track(col, &cell.display_text());
        }
        row += 1;
    }

    if grid.page_count > 1 {
        let footer = format!(
            "Page {} of {} ({} rows)",
            grid.page, grid.page_count, grid.total_filtered
        );
        worksheet.write_string_with_format(row, 0, footer, notice_format)?;
        row += 1;
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::parse;
    use budgetgrid_core::row;
    use budgetgrid_engine::filter::EmptyResultNotice;

    fn region() -> ReportRegion {
        ReportRegion {
            title: "Presupuesto General del Proyecto".into(),
            selected_key: Some("A1".into()),
            grids: vec![
                GridSnapshot {
                    title: "Items del Presupuesto".into(),
                    headers: vec!["Code".into(), "Description".into(), "Total".into()],
                    rows: vec![row!["A1", "Cement", 100.0], row!["A2", "Sand", 50.0]],
                    total_filtered: 2,
                    page: 1,
                    page_count: 1,
                    notice: None,
                },
                GridSnapshot {
                    title: "Materiales".into(),
                    headers: vec!["Code".into(), "Material".into()],
                    rows: vec![],
                    total_filtered: 0,
                    page: 1,
                    page_count: 1,
                    notice: Some(EmptyResultNotice::NoMatches),
                },
            ],
        }
    }

    #[test]
    fn report_round_trips_through_importer() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = XlsxReportSurface::new(dir.path().join("out"));
        let receipt = surface.export(&region(), &ExportOptions::default()).unwrap();

        assert_eq!(receipt.path, dir.path().join("out").join("Presupuesto_General_Proyecto.xlsx"));
        assert_eq!(receipt.grids, 2);
        assert_eq!(receipt.rows, 2);

        let bytes = std::fs::read(&receipt.path).unwrap();
        let (workbook, _) = parse(&bytes).unwrap();
        let sheet = workbook.sheet(REPORT_SHEET).unwrap();
        let rows = sheet.rows();
        assert_eq!(rows[0], row!["Presupuesto General del Proyecto"]);
        assert_eq!(rows[1], row!["Item: A1"]);
        assert_eq!(rows[3], row!["Items del Presupuesto"]);
        assert_eq!(rows[4], row!["Code", "Description", "Total"]);
        assert_eq!(rows[5], row!["A1", "Cement", 100.0]);
        assert_eq!(rows[6], row!["A2", "Sand", 50.0]);
        assert_eq!(rows[8], row!["Materiales"]);
        assert_eq!(rows[10], row!["No results"]);
    }

    #[test]
    fn invalid_options_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let mut surface = XlsxReportSurface::new(dir.path());

        let options = ExportOptions { file_name: "../escape.xlsx".into(), ..Default::default() };
        assert!(matches!(
            surface.export(&region(), &options),
            Err(ExportError::InvalidOptions(_))
        ));

        let options = ExportOptions { margin: -1.0, ..Default::default() };
        assert!(matches!(
            surface.export(&region(), &options),
            Err(ExportError::InvalidOptions(_))
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn print_scale_maps_render_scale() {
        assert_eq!(print_scale(2.0), 100);
        assert_eq!(print_scale(1.0), 50);
        assert_eq!(print_scale(0.01), 10);
        assert_eq!(print_scale(100.0), 400);
    }
}
