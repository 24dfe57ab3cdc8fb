// BudgetGrid CLI - master/detail viewer and report export for budget workbooks

mod exit_codes;
mod logging;
mod tui;
mod util;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use budgetgrid_config::settings::Settings;
use budgetgrid_config::theme::Theme;
use budgetgrid_core::cell::{CellValue, Row};
use budgetgrid_core::key::RowKey;
use budgetgrid_engine::filter::{SortDirection, SortState};
use budgetgrid_engine::report::{ExportError, Orientation};
use budgetgrid_engine::session::{GridId, ReportSession};
use budgetgrid_io::{ImportError, WorkbookSource, XlsxReportSurface};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

use exit_codes::{EXIT_ERROR, EXIT_EXPORT, EXIT_LOAD, EXIT_SUCCESS, EXIT_USAGE};
use tui::data::GridData;

#[derive(Parser)]
#[command(name = "budgetgrid")]
#[command(about = "Browse a project budget workbook: items, materials and labor")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Settings file (default: <config dir>/budgetgrid/settings.json)
    #[arg(long, global = true, env = "BUDGETGRID_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive viewer (default when no command is given)
    #[command(after_help = "\
Examples:
  budgetgrid
  budgetgrid view presupuesto.xlsx
  budgetgrid view https://example.com/presupuesto.xlsx --page-size 10")]
    View {
        /// Workbook path or http(s) URL (default: source.location)
        file: Option<String>,

        /// Rows per page
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Print one page of the master grid, and the detail grids for a selected item
    #[command(after_help = "\
Examples:
  budgetgrid show presupuesto.xlsx
  budgetgrid show presupuesto.xlsx --select A1
  budgetgrid show presupuesto.xlsx --filter Description=cem --sort Total:desc
  budgetgrid show presupuesto.xlsx --select A1 --grid materials --page 2 --json

Columns are header names (case-insensitive) or 1-based positions.")]
    Show {
        /// Workbook path or http(s) URL (default: source.location)
        file: Option<String>,

        #[command(flatten)]
        grid: GridArgs,

        /// Output JSON instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// Write the visible report to an xlsx file
    #[command(after_help = "\
Examples:
  budgetgrid export presupuesto.xlsx --select A1
  budgetgrid export presupuesto.xlsx --out reports/ --name item_a1.xlsx --landscape")]
    Export {
        /// Workbook path or http(s) URL (default: source.location)
        file: Option<String>,

        #[command(flatten)]
        grid: GridArgs,

        /// Output directory (default: export.directory)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output file name (default: export.fileName)
        #[arg(long)]
        name: Option<String>,

        /// Landscape orientation
        #[arg(long)]
        landscape: bool,
    },

    /// List the sheets of a workbook and which grid each one feeds
    Sheets {
        /// Workbook path or http(s) URL (default: source.location)
        file: Option<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

/// Selection and view options shared by `show` and `export`.
#[derive(clap::Args)]
struct GridArgs {
    /// Select the master item with this key (first column)
    #[arg(long)]
    select: Option<String>,

    /// Grid that --filter, --sort and --page apply to
    #[arg(long, value_enum, default_value = "master")]
    grid: GridArg,

    /// Column filter COL=TEXT (repeatable)
    #[arg(long, value_name = "COL=TEXT")]
    filter: Vec<String>,

    /// Sort by COL, ascending unless suffixed with :desc
    #[arg(long, value_name = "COL[:desc]")]
    sort: Option<String>,

    /// Page to show (1-based)
    #[arg(long, default_value = "1")]
    page: usize,

    /// Rows per page (default: grid.pageSize)
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum GridArg {
    Master,
    Materials,
    Labor,
}

impl From<GridArg> for GridId {
    fn from(arg: GridArg) -> Self {
        match arg {
            GridArg::Master => GridId::Master,
            GridArg::Materials => GridId::Materials,
            GridArg::Labor => GridId::Labor,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("BUDGETGRID_COMMIT"), ")",
        "\ntarget:  ", env!("BUDGETGRID_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    logging::init(&settings.log_level);

    let result = match cli.command {
        None => cmd_view(settings, None, None),
        Some(Commands::View { file, page_size }) => cmd_view(settings, file, page_size),
        Some(Commands::Show { file, grid, json }) => cmd_show(&settings, file, &grid, json),
        Some(Commands::Export { file, grid, out, name, landscape }) => {
            cmd_export(&settings, file, &grid, out, name, landscape)
        }
        Some(Commands::Sheets { file, json }) => cmd_sheets(&settings, file, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = &e.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(e.code)
        }
    }
}

/// Error with exit code and optional hint, printed by `main`.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn load(source: &WorkbookSource, err: ImportError) -> Self {
        let hint = match &err {
            ImportError::Io(_) => Some(format!(
                "check the path, or set \"source.location\" in {}",
                Settings::config_path().display()
            )),
            ImportError::Fetch { .. } => Some("check the URL and your network connection".to_string()),
            ImportError::Empty | ImportError::Unrecognized(_) => {
                Some("the file must be an .xlsx, .xls or .ods workbook".to_string())
            }
            _ => None,
        };
        Self {
            code: EXIT_LOAD,
            message: format!("cannot load {}: {}", source, err),
            hint,
        }
    }

    pub fn export(err: ExportError) -> Self {
        let hint = match &err {
            ExportError::NothingToExport => Some("load a workbook before exporting".to_string()),
            ExportError::InvalidOptions(_) => Some("check the export.* settings".to_string()),
            _ => None,
        };
        Self { code: EXIT_EXPORT, message: format!("export failed: {}", err), hint }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::general(err.to_string())
    }
}

// ============================================================================
// Loading
// ============================================================================

fn source_for(settings: &Settings, file: Option<String>) -> WorkbookSource {
    WorkbookSource::from_location(file.as_deref().unwrap_or(&settings.source_location))
}

/// Load the workbook into a fresh session, reporting missing sheets on stderr.
fn open_session(settings: &Settings, source: &WorkbookSource, page_size: Option<usize>) -> Result<ReportSession, CliError> {
    let page_size = page_size.unwrap_or(settings.page_size);
    if page_size == 0 {
        return Err(CliError::usage("--page-size must be at least 1"));
    }
    let (workbook, report) = source.load().map_err(|e| CliError::load(source, e))?;
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    let mut session = ReportSession::new(settings.sheet_roles(), page_size);
    for missing in session.replace_workbook(workbook) {
        eprintln!("warning: {}", missing);
    }
    Ok(session)
}

/// Resolve a column given as a 1-based position or a header name.
fn resolve_column(headers: &Row, spec: &str) -> Result<usize, CliError> {
    let spec = spec.trim();
    if let Ok(n) = spec.parse::<usize>() {
        if n >= 1 && n <= headers.len() {
            return Ok(n - 1);
        }
    }
    let wanted = spec.to_lowercase();
    if let Some(idx) = (0..headers.len()).find(|&c| headers.text(c).trim().to_lowercase() == wanted) {
        return Ok(idx);
    }

    let names: Vec<String> = (0..headers.len()).map(|c| headers.text(c)).collect();
    let err = CliError::usage(format!("unknown column '{}'", spec));
    if names.is_empty() {
        Err(err.with_hint("this grid has no columns"))
    } else {
        Err(err.with_hint(format!("columns: {}", names.join(", "))))
    }
}

/// The key of the master row whose first cell reads `text`, or a text key.
fn resolve_key(session: &ReportSession, text: &str) -> RowKey {
    let text = text.trim();
    let master = session
        .workbook()
        .and_then(|wb| wb.sheet(&session.roles().master));
    master
        .and_then(|sheet| {
            sheet
                .data_rows()
                .iter()
                .find(|row| row.text(0) == text)
                .and_then(RowKey::of_row)
        })
        .unwrap_or_else(|| {
            log::warn!("no master row with key '{}'", text);
            RowKey::text(text)
        })
}

/// Apply --select, --filter, --sort and --page to the session.
fn apply_grid_args(session: &mut ReportSession, args: &GridArgs) -> Result<GridId, CliError> {
    if let Some(select) = &args.select {
        let key = resolve_key(session, select);
        session.select_row(Some(key));
    }

    let grid = GridId::from(args.grid);
    if grid.is_detail() && args.select.is_none() {
        return Err(CliError::usage(format!("--grid {} needs --select", grid.title()))
            .with_hint("detail grids show rows for the selected item only"));
    }

    for filter in &args.filter {
        let Some((col, text)) = filter.split_once('=') else {
            return Err(CliError::usage(format!("invalid filter '{}'", filter)).with_hint("use COL=TEXT"));
        };
        let col = resolve_column(session.headers(grid), col)?;
        session.set_filter(grid, col, text);
    }

    if let Some(sort) = &args.sort {
        let (col, descending) = match sort.rsplit_once(':') {
            Some((col, dir)) if dir.eq_ignore_ascii_case("desc") => (col, true),
            Some((col, dir)) if dir.eq_ignore_ascii_case("asc") => (col, false),
            _ => (sort.as_str(), false),
        };
        let col = resolve_column(session.headers(grid), col)?;
        session.toggle_sort(grid, col);
        if descending {
            session.toggle_sort(grid, col);
        }
    }

    session.set_page(grid, args.page);
    Ok(grid)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_view(settings: Settings, file: Option<String>, page_size: Option<usize>) -> Result<(), CliError> {
    let page_size = page_size.unwrap_or(settings.page_size);
    if page_size == 0 {
        return Err(CliError::usage("--page-size must be at least 1"));
    }
    let source = source_for(&settings, file);

    let log_path = Settings::config_dir().join("budgetgrid.log");
    if let Err(e) = logging::redirect_to_file(&log_path) {
        eprintln!("warning: cannot open log file {}: {}", log_path.display(), e);
    }

    let theme = Theme::load(settings.theme_file().as_deref());
    let session = ReportSession::new(settings.sheet_roles(), page_size);
    tui::run(session, settings, theme, source).map_err(CliError::general)
}

fn cmd_show(settings: &Settings, file: Option<String>, args: &GridArgs, json: bool) -> Result<(), CliError> {
    let source = source_for(settings, file);
    let mut session = open_session(settings, &source, args.page_size)?;
    apply_grid_args(&mut session, args)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let value = session_json(&session);
        let text = serde_json::to_string_pretty(&value).map_err(|e| CliError::general(e.to_string()))?;
        writeln!(out, "{}", text)?;
        return Ok(());
    }

    for (i, grid) in session.visible_grids().into_iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let page = session.page(grid);
        let data = GridData::from_page(session.headers(grid), &page, session.view(grid));
        tui::write_plain(&mut out, grid.title(), &data)?;
    }
    Ok(())
}

fn cmd_export(
    settings: &Settings,
    file: Option<String>,
    args: &GridArgs,
    out: Option<PathBuf>,
    name: Option<String>,
    landscape: bool,
) -> Result<(), CliError> {
    let source = source_for(settings, file);
    let mut session = open_session(settings, &source, args.page_size)?;
    apply_grid_args(&mut session, args)?;

    let mut options = settings.export_options();
    if let Some(name) = name {
        options.file_name = name;
    }
    if landscape {
        options.orientation = Orientation::Landscape;
    }
    let mut surface = XlsxReportSurface::new(out.unwrap_or_else(|| settings.export_dir()));
    let receipt = session.export(&mut surface, &options).map_err(CliError::export)?;

    println!(
        "exported {} ({} grid{}, {} row{})",
        receipt.path.display(),
        receipt.grids,
        if receipt.grids == 1 { "" } else { "s" },
        receipt.rows,
        if receipt.rows == 1 { "" } else { "s" },
    );
    Ok(())
}

fn cmd_sheets(settings: &Settings, file: Option<String>, json: bool) -> Result<(), CliError> {
    let source = source_for(settings, file);
    let (workbook, report) = source.load().map_err(|e| CliError::load(&source, e))?;
    let roles = settings.sheet_roles();

    let role_of = |name: &str| {
        GridId::ALL
            .iter()
            .copied()
            .find(|grid| roles.sheet_for(*grid) == name)
    };

    if json {
        let sheets: Vec<Value> = workbook
            .sheets()
            .iter()
            .map(|sheet| {
                json!({
                    "name": sheet.name,
                    "columns": sheet.column_count(),
                    "rows": sheet.row_count(),
                    "grid": role_of(&sheet.name).map(grid_name),
                })
            })
            .collect();
        let missing: Vec<&str> = GridId::ALL
            .iter()
            .map(|grid| roles.sheet_for(*grid))
            .filter(|name| !workbook.has_sheet(name))
            .collect();
        let value = json!({ "sheets": sheets, "missing": missing, "warnings": report.warnings });
        let text = serde_json::to_string_pretty(&value).map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    let width = workbook
        .sheets()
        .iter()
        .map(|s| util::display_width(&s.name))
        .max()
        .unwrap_or(0);
    for sheet in workbook.sheets() {
        let role = role_of(&sheet.name).map(|g| format!("  -> {}", g.title())).unwrap_or_default();
        println!(
            "{}  {} rows x {} cols{}",
            util::pad_right(&sheet.name, width),
            sheet.row_count(),
            sheet.column_count(),
            role
        );
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    for grid in GridId::ALL {
        let name = roles.sheet_for(grid);
        if !workbook.has_sheet(name) {
            eprintln!("warning: sheet '{}' for {} not found", name, grid.title());
        }
    }
    Ok(())
}

// ============================================================================
// JSON output
// ============================================================================

fn grid_name(grid: GridId) -> &'static str {
    match grid {
        GridId::Master => "master",
        GridId::Materials => "materials",
        GridId::Labor => "labor",
    }
}

fn cell_json(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => Value::Null,
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
    }
}

fn sort_json(headers: &Row, sort: SortState) -> Value {
    let direction = match sort.direction {
        SortDirection::Ascending => "asc",
        SortDirection::Descending => "desc",
    };
    json!({ "column": headers.text(sort.column), "direction": direction })
}

fn session_json(session: &ReportSession) -> Value {
    let grids: Vec<Value> = session
        .visible_grids()
        .into_iter()
        .map(|grid| {
            let headers = session.headers(grid);
            let page = session.page(grid);
            let view = session.view(grid);
            let rows: Vec<Value> = page
                .rows
                .iter()
                .map(|row| Value::Array((0..headers.len()).map(|c| cell_json(row.cell(c))).collect()))
                .collect();
            let filters: serde_json::Map<String, Value> = view
                .filters()
                .filter(|(c, _)| *c < headers.len())
                .map(|(c, f)| (headers.text(c), Value::String(f.value.clone())))
                .collect();
            json!({
                "grid": grid_name(grid),
                "title": grid.title(),
                "headers": (0..headers.len()).map(|c| headers.text(c)).collect::<Vec<_>>(),
                "rows": rows,
                "page": page.page,
                "pageCount": page.page_count(),
                "pageSize": page.page_size,
                "totalFiltered": page.total_filtered,
                "filters": filters,
                "sort": view.sort().map(|s| sort_json(headers, s)),
                "notice": page.notice.map(|n| n.message()),
            })
        })
        .collect();

    json!({
        "selected": session.selection().map(|k| k.to_string()),
        "grids": grids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetgrid_core::row;

    #[test]
    fn resolve_column_by_name_or_position() {
        let headers = row!["Code", "Descripción", "Total"];
        assert_eq!(resolve_column(&headers, "total").unwrap(), 2);
        assert_eq!(resolve_column(&headers, "DESCRIPCIÓN").unwrap(), 1);
        assert_eq!(resolve_column(&headers, "1").unwrap(), 0);

        let err = resolve_column(&headers, "4").unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert_eq!(err.hint.as_deref(), Some("columns: Code, Descripción, Total"));
    }

    #[test]
    fn cell_json_types() {
        assert_eq!(cell_json(&CellValue::Empty), Value::Null);
        assert_eq!(cell_json(&CellValue::text("A1")), json!("A1"));
        assert_eq!(cell_json(&CellValue::Number(2.5)), json!(2.5));
    }
}
