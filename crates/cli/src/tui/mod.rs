pub mod data;

use std::cell::RefCell;
use std::io::{self, stdout, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use budgetgrid_config::settings::Settings;
use budgetgrid_config::theme::Theme;
use budgetgrid_config::Color as ThemeColor;
use budgetgrid_core::selection::SelectionChange;
use budgetgrid_engine::events::SessionEvent;
use budgetgrid_engine::session::{GridId, ReportSession};
use budgetgrid_io::{WorkbookSource, XlsxReportSurface};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};

use crate::util;
use data::GridData;

/// What the keyboard is currently driving.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Editing the filter of (grid, column). `original` is restored on Esc.
    Filter {
        grid: GridId,
        col: usize,
        buffer: String,
        original: String,
    },
    /// Typing a workbook path to import.
    Import { buffer: String },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusMessage {
    text: String,
    is_error: bool,
}

struct TuiApp {
    session: ReportSession,
    settings: Settings,
    theme: Theme,
    /// Where `r` reloads from
    startup_source: WorkbookSource,
    /// Set while no workbook could be loaded
    load_error: Option<String>,
    focus: GridId,
    /// Cursor row within the master grid's visible page
    cursor_row: usize,
    /// Focused column per grid (Master, Materials, Labor)
    focus_cols: [usize; 3],
    mode: Mode,
    status: Option<StatusMessage>,
    events: Rc<RefCell<Vec<SessionEvent>>>,
    should_quit: bool,
}

fn grid_index(grid: GridId) -> usize {
    match grid {
        GridId::Master => 0,
        GridId::Materials => 1,
        GridId::Labor => 2,
    }
}

impl TuiApp {
    fn new(mut session: ReportSession, settings: Settings, theme: Theme, startup_source: WorkbookSource) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        session.subscribe(Box::new(move |e: &SessionEvent| sink.borrow_mut().push(e.clone())));
        Self {
            session,
            settings,
            theme,
            startup_source,
            load_error: None,
            focus: GridId::Master,
            cursor_row: 0,
            focus_cols: [0; 3],
            mode: Mode::Normal,
            status: None,
            events,
            should_quit: false,
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), is_error: false });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), is_error: true });
    }

    /// Turn session events raised by the last action into status messages.
    fn drain_events(&mut self) {
        let events: Vec<SessionEvent> = self.events.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                SessionEvent::WorkbookReplaced { missing, .. } if !missing.is_empty() => {
                    let names: Vec<String> = missing.iter().map(|m| m.sheet.clone()).collect();
                    self.error(format!("missing sheet(s): {}", names.join(", ")));
                }
                SessionEvent::ViewChanged(GridId::Master) => {
                    self.clamp_cursor();
                }
                // Detail grids are hidden without a selection
                SessionEvent::SelectionChanged(SelectionChange::Cleared { .. }) => {
                    self.focus = GridId::Master;
                }
                _ => {}
            }
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.session.master_page().rows.len();
        self.cursor_row = self.cursor_row.min(len.saturating_sub(1));
    }

    fn focus_col(&self) -> usize {
        self.focus_cols[grid_index(self.focus)]
    }

    // -------------------------------------------------------------------------
    // Loading and export
    // -------------------------------------------------------------------------

    fn load_from(&mut self, source: &WorkbookSource) {
        match source.load() {
            Ok((workbook, report)) => {
                self.session.replace_workbook(workbook);
                self.load_error = None;
                self.cursor_row = 0;
                self.focus = GridId::Master;
                self.focus_cols = [0; 3];
                self.info(format!("loaded {}: {}", source, report.summary()));
                if let Some(warning) = report.warning_summary() {
                    self.error(warning);
                }
            }
            Err(e) => {
                log::error!("cannot load {}: {}", source, e);
                if self.session.is_awaiting_data() {
                    self.load_error = Some(e.to_string());
                }
                self.error(format!("cannot load data: {}", e));
            }
        }
    }

    fn export(&mut self) {
        let mut surface = XlsxReportSurface::new(self.settings.export_dir());
        let options = self.settings.export_options();
        match self.session.export(&mut surface, &options) {
            Ok(receipt) => self.info(format!("exported to {}", receipt.path.display())),
            Err(e) => self.error(format!("export failed: {}", e)),
        }
    }

    // -------------------------------------------------------------------------
    // Keys
    // -------------------------------------------------------------------------

    fn handle_key(&mut self, key: KeyEvent) {
        match self.mode.clone() {
            Mode::Help => self.mode = Mode::Normal,
            Mode::Filter { grid, col, buffer, original } => {
                self.handle_filter_key(key, grid, col, buffer, original)
            }
            Mode::Import { buffer } => self.handle_import_key(key, buffer),
            Mode::Normal => self.handle_normal_key(key),
        }
        self.drain_events();
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let focus = self.focus;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.mode = Mode::Help,
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor_row += 1;
                self.clamp_cursor();
            }
            KeyCode::Enter => {
                if self.session.master_page().rows.is_empty() {
                    return;
                }
                if let Some(change) = self.session.select_master_row(self.cursor_row) {
                    log::debug!("selection: {:?}", change);
                }
            }
            KeyCode::Char('x') => {
                self.session.clear_selection();
            }
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Left | KeyCode::Char('h') => {
                let idx = grid_index(focus);
                self.focus_cols[idx] = self.focus_cols[idx].saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let cols = self.session.headers(focus).len();
                let idx = grid_index(focus);
                self.focus_cols[idx] = (self.focus_cols[idx] + 1).min(cols.saturating_sub(1));
            }
            KeyCode::Char('s') => {
                if self.focus_col() < self.session.headers(focus).len() {
                    self.session.toggle_sort(focus, self.focus_col());
                }
            }
            KeyCode::Char('c') => {
                if self.session.clear_filters(focus) {
                    self.info(format!("filters cleared: {}", focus.title()));
                }
            }
            KeyCode::Char('u') => {
                if self.session.clear_sort(focus) {
                    self.info(format!("sort cleared: {}", focus.title()));
                }
            }
            KeyCode::Char('/') => {
                let col = self.focus_col();
                if col < self.session.headers(focus).len() {
                    let current = self.session.view(focus).filter(col).unwrap_or("").to_string();
                    self.mode = Mode::Filter {
                        grid: focus,
                        col,
                        buffer: current.clone(),
                        original: current,
                    };
                }
            }
            KeyCode::Char(']') | KeyCode::PageDown => {
                if self.session.next_page(focus) && focus == GridId::Master {
                    self.cursor_row = 0;
                }
            }
            KeyCode::Char('[') | KeyCode::PageUp => {
                if self.session.prev_page(focus) && focus == GridId::Master {
                    self.cursor_row = 0;
                }
            }
            KeyCode::Char('o') => self.mode = Mode::Import { buffer: String::new() },
            KeyCode::Char('r') => {
                let source = self.startup_source.clone();
                self.load_from(&source);
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
    }

    /// Filters apply on every keystroke; Esc restores the text from before.
    fn handle_filter_key(&mut self, key: KeyEvent, grid: GridId, col: usize, mut buffer: String, original: String) {
        match key.code {
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                return;
            }
            KeyCode::Esc => {
                self.session.set_filter(grid, col, original);
                self.mode = Mode::Normal;
                return;
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => return,
        }
        self.session.set_filter(grid, col, buffer.clone());
        if grid == GridId::Master {
            self.cursor_row = 0;
        }
        self.mode = Mode::Filter { grid, col, buffer, original };
    }

    fn handle_import_key(&mut self, key: KeyEvent, mut buffer: String) {
        match key.code {
            KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let path = buffer.trim();
                if !path.is_empty() {
                    let source = WorkbookSource::Path(PathBuf::from(path));
                    self.load_from(&source);
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
                self.mode = Mode::Import { buffer };
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                self.mode = Mode::Import { buffer };
            }
            _ => {}
        }
    }

    /// Tab order: master, then the detail grids while a row is selected.
    fn cycle_focus(&mut self) {
        let visible = self.session.visible_grids();
        let mut next = self.focus.next();
        while !visible.contains(&next) {
            next = next.next();
        }
        self.focus = next;
    }

    // -------------------------------------------------------------------------
    // Drawing
    // -------------------------------------------------------------------------

    fn rgb(color: ThemeColor) -> Color {
        let (r, g, b) = color.to_rgb8();
        Color::Rgb(r, g, b)
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_status(frame, chunks[2]);

        if self.mode == Mode::Help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let selected = match self.session.selection() {
            Some(key) => format!(" | item {}", key),
            None => String::new(),
        };
        let title = format!(
            " {} Presupuesto General del Proyecto | {}{} ",
            self.theme.title_icon, self.startup_source, selected
        );
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Self::rgb(self.theme.title_color))
                .bg(Self::rgb(self.theme.icon_background))
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Self::rgb(self.theme.icon_background)));
        frame.render_widget(para, area);
    }

    fn draw_body(&self, frame: &mut Frame, area: Rect) {
        if let Some(err) = &self.load_error {
            let lines = vec![
                Line::from(Span::styled(
                    "Cannot load data",
                    Style::default().fg(Self::rgb(self.theme.primary_dark)).add_modifier(Modifier::BOLD),
                )),
                Line::from(err.as_str()),
                Line::from(""),
                Line::from("Press o to open a workbook, r to retry, q to quit."),
            ];
            frame.render_widget(Paragraph::new(lines).block(Block::default().borders(Borders::ALL)), area);
            return;
        }

        if self.session.selection().is_none() {
            self.draw_grid(frame, area, GridId::Master);
            return;
        }

        let rows = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);
        self.draw_grid(frame, rows[0], GridId::Master);
        let details = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[1]);
        self.draw_grid(frame, details[0], GridId::Materials);
        self.draw_grid(frame, details[1], GridId::Labor);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect, grid: GridId) {
        let headers = self.session.headers(grid);
        let page = self.session.page(grid);
        let view = self.session.view(grid);
        let data = GridData::from_page(headers, &page, view);
        let focused = grid == self.focus;

        let border = if focused { self.theme.primary } else { self.theme.border };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Self::rgb(border)))
            .title(format!(" {} · {} ", grid.title(), data.page_label()))
            .title_style(
                Style::default()
                    .fg(Self::rgb(self.theme.primary_dark))
                    .add_modifier(Modifier::BOLD),
            );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = Vec::new();
        let widths = util::fit_widths(&data.col_widths, inner.width as usize, 3);
        let focus_col = self.focus_cols[grid_index(grid)];

        // Header line
        let mut header_spans = Vec::new();
        for (c, name) in data.col_names.iter().enumerate() {
            let style = if focused && c == focus_col {
                Style::default().fg(Self::rgb(self.theme.primary)).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            header_spans.push(Span::styled(format!("{} ", util::pad_right(name, widths[c])), style));
        }
        lines.push(Line::from(header_spans));

        if !data.filters.is_empty() {
            let text: Vec<String> = data.filters.iter().map(|(c, f)| format!("{}~\"{}\"", c, f)).collect();
            lines.push(Line::from(Span::styled(
                format!("filter: {}", text.join("  ")),
                Style::default().fg(Self::rgb(self.theme.text_secondary)),
            )));
        }

        if let Some(notice) = data.notice {
            lines.push(Line::from(Span::styled(
                notice.message(),
                Style::default().fg(Self::rgb(self.theme.text_secondary)).add_modifier(Modifier::ITALIC),
            )));
        }

        let is_cursor_grid = grid == GridId::Master;
        let selected = self.session.selection();
        for (r, row) in data.rows.iter().enumerate() {
            let is_selected = is_cursor_grid
                && selected.is_some_and(|k| page.rows.get(r).is_some_and(|pr| k.matches(pr)));
            let row_style = if is_cursor_grid && r == self.cursor_row && focused {
                Style::default().fg(Color::Black).bg(Self::rgb(self.theme.primary_light))
            } else if is_selected {
                Style::default().add_modifier(Modifier::BOLD).fg(Self::rgb(self.theme.primary_dark))
            } else {
                Style::default()
            };
            let spans: Vec<Span> = row
                .iter()
                .enumerate()
                .map(|(c, value)| Span::styled(format!("{} ", data.format_cell(c, value, widths[c])), row_style))
                .collect();
            lines.push(Line::from(spans));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = match &self.mode {
            Mode::Filter { grid, col, buffer, .. } => (
                format!(" filter {} / {}: {}_", grid.title(), self.session.headers(*grid).text(*col), buffer),
                Style::default().fg(Color::Black).bg(Self::rgb(self.theme.primary_light)),
            ),
            Mode::Import { buffer } => (
                format!(" open workbook: {}_", buffer),
                Style::default().fg(Color::Black).bg(Self::rgb(self.theme.primary_light)),
            ),
            _ => match &self.status {
                Some(msg) if msg.is_error => (
                    format!(" {}", msg.text),
                    Style::default().fg(Color::White).bg(Self::rgb(self.theme.primary_dark)),
                ),
                Some(msg) => (format!(" {}", msg.text), Style::default().fg(Color::Black).bg(Color::Gray)),
                None => (
                    format!(" focus: {}  ?: help ", self.focus.title()),
                    Style::default().fg(Color::Black).bg(Color::Gray),
                ),
            },
        };
        frame.render_widget(Paragraph::new(Line::from(Span::styled(text, style))).style(style), area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Master grid",
            "  -----------",
            "  up/down / j k     Move cursor",
            "  Enter             Select row (show details)",
            "  x                 Clear selection",
            "",
            "  Focused grid",
            "  ------------",
            "  Tab               Next grid",
            "  left/right / h l  Focus column",
            "  s                 Sort column (again: flip)",
            "  u                 Clear sort",
            "  /                 Filter column",
            "  c                 Clear filters",
            "  [ ] / PgUp PgDn   Previous/next page",
            "",
            "  Workbook",
            "  --------",
            "  o                 Open workbook file",
            "  r                 Reload startup source",
            "  e                 Export report",
            "  q / Esc           Quit",
            "",
        ];
        let help_width: u16 = 48;
        let help_height: u16 = help_lines.len() as u16 + 2;

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(
            area.x + x,
            area.y + y,
            help_width.min(area.width),
            help_height.min(area.height),
        );

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Self::rgb(self.theme.text)))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Self::rgb(self.theme.primary)))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Self::rgb(self.theme.primary)).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Self::rgb(self.theme.paper)));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Run the interactive viewer. Loads the startup source first; a load
/// failure is shown inside the viewer rather than aborting.
pub fn run(session: ReportSession, settings: Settings, theme: Theme, source: WorkbookSource) -> Result<(), String> {
    let mut app = TuiApp::new(session, settings, theme, source.clone());
    app.load_from(&source);
    app.drain_events();
    run_app(app)
}

fn run_app(mut app: TuiApp) -> Result<(), String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(Duration::from_millis(100)).map_err(|e| format!("event poll error: {}", e))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {}", e))? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Print one grid as a plain text table (no TUI, no raw mode).
pub fn write_plain<W: Write>(w: &mut W, title: &str, data: &GridData) -> io::Result<()> {
    writeln!(w, "{} ({})", title, data.page_label())?;

    if !data.filters.is_empty() {
        let text: Vec<String> = data.filters.iter().map(|(c, f)| format!("{}~\"{}\"", c, f)).collect();
        writeln!(w, "filter: {}", text.join("  "))?;
    }

    // Header
    let header: Vec<String> = data
        .col_names
        .iter()
        .enumerate()
        .map(|(c, name)| util::pad_right(name, data.col_widths[c]))
        .collect();
    writeln!(w, "{}", header.join(" ").trim_end())?;

    // Separator
    let sep: Vec<String> = data.col_widths.iter().map(|cw| "-".repeat(*cw)).collect();
    writeln!(w, "{}", sep.join(" "))?;

    if let Some(notice) = data.notice {
        writeln!(w, "({})", notice.message())?;
    }

    // Rows
    for row in &data.rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(c, value)| data.format_cell(c, value, data.col_widths[c]))
            .collect();
        writeln!(w, "{}", cells.join(" ").trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use budgetgrid_core::cell::{CellValue, Row};
    use budgetgrid_core::key::RowKey;
    use budgetgrid_core::row;
    use budgetgrid_engine::sheet::SheetTable;
    use budgetgrid_engine::workbook::Workbook;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut TuiApp, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn app() -> TuiApp {
        let mut session = ReportSession::default();
        session.replace_workbook(Workbook::new(vec![
            SheetTable::new(
                "Presupuesto_General",
                vec![
                    row!["Code", "Description", "Total"],
                    row!["A1", "Cement", 100.0],
                    row!["A2", "Sand", 50.0],
                ],
            ),
            SheetTable::new(
                "Asignación_Materiales",
                vec![row!["Code", "Material"], row!["A1", "Bag"], row!["A2", "Shovel"]],
            ),
            SheetTable::new("Asignación_ManoObra", vec![row!["Code", "Worker"], row!["A2", "Mason"]]),
        ]));
        TuiApp::new(
            session,
            Settings::default(),
            Theme::light(),
            WorkbookSource::from_location("mi_presupuesto.xlsx"),
        )
    }

    fn screen(app: &TuiApp) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn enter_selects_row_under_cursor() {
        let mut app = app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.selection(), Some(&RowKey::text("A2")));

        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.session.selection(), None);
    }

    #[test]
    fn keyless_row_returns_focus_to_master() {
        let mut app = app();
        app.session.replace_workbook(Workbook::new(vec![
            SheetTable::new(
                "Presupuesto_General",
                vec![
                    row!["Code", "Description"],
                    row!["A1", "Cement"],
                    Row::new(vec![CellValue::Empty, CellValue::text("Orphan")]),
                ],
            ),
            SheetTable::new("Asignación_Materiales", vec![row!["Code", "Material"], row!["A1", "Bag"]]),
            SheetTable::new("Asignación_ManoObra", vec![row!["Code", "Worker"]]),
        ]));

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, GridId::Materials);

        app.cursor_row = 1;
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.selection(), None);
        assert_eq!(app.focus, GridId::Master);

        app.handle_key(key(KeyCode::Char('s')));
        assert!(app.session.view(GridId::Materials).sort().is_none());
        assert!(app.session.view(GridId::Master).sort().is_some());
    }

    #[test]
    fn clear_keys_reset_focused_grid() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('/')));
        type_text(&mut app, "san");
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.session.master_page().total_filtered, 1);

        app.handle_key(key(KeyCode::Char('c')));
        assert_eq!(app.session.master_page().total_filtered, 2);
        assert!(app.session.view(GridId::Master).sort().is_some());

        app.handle_key(key(KeyCode::Char('u')));
        assert!(app.session.view(GridId::Master).sort().is_none());
        assert!(app.status.as_ref().is_some_and(|s| s.text == "sort cleared: Items del Presupuesto"));
    }

    #[test]
    fn cursor_stays_on_page() {
        let mut app = app();
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(app.cursor_row, 1);
    }

    #[test]
    fn tab_skips_details_without_selection() {
        let mut app = app();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, GridId::Master);

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, GridId::Materials);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, GridId::Labor);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, GridId::Master);
    }

    #[test]
    fn filter_applies_live_and_esc_restores() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('/')));
        type_text(&mut app, "san");
        assert_eq!(app.session.master_page().total_filtered, 1);

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.session.view(GridId::Master).filter(1), None);

        app.handle_key(key(KeyCode::Char('/')));
        type_text(&mut app, "cem");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.view(GridId::Master).filter(1), Some("cem"));
    }

    #[test]
    fn sort_key_toggles_focused_column() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('s')));
        let first = app.session.master_page().rows[0].text(0);
        assert_eq!(first, "A2");
        app.handle_key(key(KeyCode::Char('s')));
        let first = app.session.master_page().rows[0].text(0);
        assert_eq!(first, "A1");
    }

    #[test]
    fn failed_import_keeps_workbook() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('o')));
        type_text(&mut app, "/nonexistent/budget.xlsx");
        app.handle_key(key(KeyCode::Enter));

        assert!(!app.session.is_awaiting_data());
        assert!(app.load_error.is_none());
        assert!(app.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn draw_shows_master_and_details() {
        let mut app = app();
        let before = screen(&app);
        assert!(before.contains("Items del Presupuesto"));
        assert!(before.contains("Cement"));
        assert!(!before.contains("Materiales"));

        app.handle_key(key(KeyCode::Enter));
        let after = screen(&app);
        assert!(after.contains("Materiales"));
        assert!(after.contains("Bag"));
        assert!(after.contains("Mano de Obra"));
        assert!(after.contains("No results"));
    }

    #[test]
    fn help_popup_dismissed_by_any_key() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('?')));
        assert!(screen(&app).contains("Keybindings"));
        app.handle_key(key(KeyCode::Char('z')));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn write_plain_renders_table() {
        let app = app();
        let page = app.session.master_page();
        let data = GridData::from_page(app.session.headers(GridId::Master), &page, app.session.view(GridId::Master));
        let mut out = Vec::new();
        write_plain(&mut out, "Items del Presupuesto", &data).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Items del Presupuesto (page 1/1 · rows 1-2 of 2)");
        assert_eq!(lines[1], "Code Description Total");
        assert_eq!(lines[3], "A1   Cement        100");
        assert_eq!(lines[4], "A2   Sand           50");
    }
}
