//! The report session: one workbook, one selection, three grids.
//!
//! The master grid shows the budget sheet. The materials and labor grids show
//! the rows of their sheets whose first column equals the selected master
//! key. Pages are computed on demand from the current workbook, selection and
//! view state; nothing derived is cached.

use std::fmt;

use budgetgrid_core::cell::Row;
use budgetgrid_core::key::RowKey;
use budgetgrid_core::selection::{SelectionChange, SelectionController};
use serde::{Deserialize, Serialize};

use crate::events::{EventCallback, SessionEvent};
use crate::filter::{present, GridPage, GridViewState, DEFAULT_PAGE_SIZE};
use crate::relate::filter_by_key;
use crate::report::{
    ExportError, ExportOptions, ExportReceipt, ExportSurface, GridSnapshot, ReportRegion,
    REPORT_TITLE,
};
use crate::sheet::SheetTable;
use crate::workbook::Workbook;

static NO_HEADERS: Row = Row::EMPTY;

/// The three grids of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridId {
    Master,
    Materials,
    Labor,
}

impl GridId {
    pub const ALL: [GridId; 3] = [GridId::Master, GridId::Materials, GridId::Labor];

    pub fn title(self) -> &'static str {
        match self {
            GridId::Master => "Items del Presupuesto",
            GridId::Materials => "Materiales",
            GridId::Labor => "Mano de Obra",
        }
    }

    /// Next grid in focus order, wrapping.
    pub fn next(self) -> Self {
        match self {
            GridId::Master => GridId::Materials,
            GridId::Materials => GridId::Labor,
            GridId::Labor => GridId::Master,
        }
    }

    pub fn is_detail(self) -> bool {
        self != GridId::Master
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// The dependent grids, filtered by the selected master key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailGrid {
    Materials,
    Labor,
}

impl DetailGrid {
    pub fn grid(self) -> GridId {
        match self {
            DetailGrid::Materials => GridId::Materials,
            DetailGrid::Labor => GridId::Labor,
        }
    }
}

/// Which sheet feeds which grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetRoles {
    pub master: String,
    pub materials: String,
    pub labor: String,
}

impl Default for SheetRoles {
    fn default() -> Self {
        Self {
            master: "Presupuesto_General".to_string(),
            materials: "Asignación_Materiales".to_string(),
            labor: "Asignación_ManoObra".to_string(),
        }
    }
}

impl SheetRoles {
    pub fn sheet_for(&self, grid: GridId) -> &str {
        match grid {
            GridId::Master => &self.master,
            GridId::Materials => &self.materials,
            GridId::Labor => &self.labor,
        }
    }
}

/// A role sheet the workbook does not contain. The grid renders empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSheetWarning {
    pub grid: GridId,
    pub sheet: String,
}

impl fmt::Display for MissingSheetWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet '{}' not found; {} will be empty", self.sheet, self.grid)
    }
}

pub struct ReportSession {
    workbook: Option<Workbook>,
    roles: SheetRoles,
    selection: SelectionController,
    master_view: GridViewState,
    materials_view: GridViewState,
    labor_view: GridViewState,
    subscribers: Vec<EventCallback>,
}

impl fmt::Debug for ReportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportSession")
            .field("workbook", &self.workbook.as_ref().map(|w| w.sheet_count()))
            .field("roles", &self.roles)
            .field("selection", &self.selection.current())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl Default for ReportSession {
    fn default() -> Self {
        Self::new(SheetRoles::default(), DEFAULT_PAGE_SIZE)
    }
}

impl ReportSession {
    /// Session with no workbook yet ("awaiting data").
    pub fn new(roles: SheetRoles, page_size: usize) -> Self {
        Self {
            workbook: None,
            roles,
            selection: SelectionController::new(),
            master_view: GridViewState::new(page_size),
            materials_view: GridViewState::new(page_size),
            labor_view: GridViewState::new(page_size),
            subscribers: Vec::new(),
        }
    }

    pub fn roles(&self) -> &SheetRoles {
        &self.roles
    }

    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    pub fn is_awaiting_data(&self) -> bool {
        self.workbook.is_none()
    }

    pub fn selection(&self) -> Option<&RowKey> {
        self.selection.current()
    }

    pub fn subscribe(&mut self, callback: EventCallback) {
        self.subscribers.push(callback);
    }

    fn emit(&mut self, event: SessionEvent) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    // -------------------------------------------------------------------------
    // Workbook
    // -------------------------------------------------------------------------

    /// Install a freshly parsed workbook.
    ///
    /// Clears the selection and the detail grids' view state and returns the
    /// master grid to page 1. Master filters and sort carry over.
    pub fn replace_workbook(&mut self, workbook: Workbook) -> Vec<MissingSheetWarning> {
        let missing: Vec<MissingSheetWarning> = GridId::ALL
            .iter()
            .filter_map(|grid| {
                let sheet = self.roles.sheet_for(*grid);
                (!workbook.has_sheet(sheet)).then(|| MissingSheetWarning {
                    grid: *grid,
                    sheet: sheet.to_string(),
                })
            })
            .collect();
        for warning in &missing {
            log::warn!("{}", warning);
        }
        log::info!(
            "workbook loaded: {} sheet(s) [{}]",
            workbook.sheet_count(),
            workbook.sheet_names().join(", ")
        );

        let sheets = workbook.sheet_count();
        self.workbook = Some(workbook);
        self.master_view.set_page(1);
        self.materials_view.reset();
        self.labor_view.reset();
        if let Some(change) = self.selection.clear() {
            self.emit(SessionEvent::SelectionChanged(change));
        }
        self.emit(SessionEvent::WorkbookReplaced { sheets, missing: missing.clone() });
        missing
    }

    fn sheet(&self, grid: GridId) -> Option<&SheetTable> {
        self.workbook.as_ref()?.sheet(self.roles.sheet_for(grid))
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Select a master key, or clear with `None`.
    pub fn select_row(&mut self, key: Option<RowKey>) -> Option<SelectionChange> {
        let change = self.selection.select(key)?;
        match &change {
            SelectionChange::Selected { current, .. } => log::debug!("selected master row {}", current),
            SelectionChange::Cleared { .. } => {
                self.materials_view.reset();
                self.labor_view.reset();
                log::debug!("selection cleared");
            }
        }
        self.emit(SessionEvent::SelectionChanged(change.clone()));
        Some(change)
    }

    /// Select the row at `index` within the master grid's visible page.
    ///
    /// A row with an empty first cell has no key and clears the selection.
    /// An index outside the page changes nothing.
    pub fn select_master_row(&mut self, index: usize) -> Option<SelectionChange> {
        let key = {
            let page = self.master_page();
            let row = page.rows.get(index)?;
            RowKey::of_row(row)
        };
        self.select_row(key)
    }

    pub fn clear_selection(&mut self) -> Option<SelectionChange> {
        self.select_row(None)
    }

    // -------------------------------------------------------------------------
    // Grids
    // -------------------------------------------------------------------------

    pub fn view(&self, grid: GridId) -> &GridViewState {
        match grid {
            GridId::Master => &self.master_view,
            GridId::Materials => &self.materials_view,
            GridId::Labor => &self.labor_view,
        }
    }

    fn view_mut(&mut self, grid: GridId) -> &mut GridViewState {
        match grid {
            GridId::Master => &mut self.master_view,
            GridId::Materials => &mut self.materials_view,
            GridId::Labor => &mut self.labor_view,
        }
    }

    /// Header row of the sheet behind `grid` (empty if the sheet is missing).
    pub fn headers(&self, grid: GridId) -> &Row {
        self.sheet(grid).map(|s| s.header()).unwrap_or(&NO_HEADERS)
    }

    /// Compute the visible page of a grid.
    pub fn page(&self, grid: GridId) -> GridPage<'_> {
        let view = self.view(grid);
        let sheet = self.sheet(grid);
        let headers = self.headers(grid);
        match grid {
            GridId::Master => {
                let rows = sheet.map(|s| s.data_rows()).unwrap_or(&[]);
                present(headers, rows, view)
            }
            GridId::Materials | GridId::Labor => match self.selection.current() {
                None => GridPage::awaiting_selection(view),
                Some(key) => present(headers, filter_by_key(sheet, Some(key)), view),
            },
        }
    }

    pub fn master_page(&self) -> GridPage<'_> {
        self.page(GridId::Master)
    }

    pub fn detail_page(&self, detail: DetailGrid) -> GridPage<'_> {
        self.page(detail.grid())
    }

    /// Grids currently on screen: detail grids only while a row is selected.
    pub fn visible_grids(&self) -> Vec<GridId> {
        if self.selection.has_selection() {
            GridId::ALL.to_vec()
        } else {
            vec![GridId::Master]
        }
    }

    fn view_changed(&mut self, grid: GridId, changed: bool) -> bool {
        if changed {
            log::debug!("{} view changed", grid);
            self.emit(SessionEvent::ViewChanged(grid));
        }
        changed
    }

    pub fn set_filter(&mut self, grid: GridId, col: usize, text: impl Into<String>) -> bool {
        let changed = self.view_mut(grid).set_filter(col, text);
        self.view_changed(grid, changed)
    }

    pub fn clear_filters(&mut self, grid: GridId) -> bool {
        let changed = self.view_mut(grid).clear_filters();
        self.view_changed(grid, changed)
    }

    pub fn toggle_sort(&mut self, grid: GridId, col: usize) -> bool {
        self.view_mut(grid).toggle_sort(col);
        self.view_changed(grid, true)
    }

    pub fn clear_sort(&mut self, grid: GridId) -> bool {
        let changed = self.view_mut(grid).clear_sort();
        self.view_changed(grid, changed)
    }

    pub fn set_page(&mut self, grid: GridId, page: usize) -> bool {
        let changed = self.view_mut(grid).set_page(page);
        self.view_changed(grid, changed)
    }

    pub fn next_page(&mut self, grid: GridId) -> bool {
        let count = self.page(grid).page_count();
        let changed = self.view_mut(grid).next_page(count);
        self.view_changed(grid, changed)
    }

    pub fn prev_page(&mut self, grid: GridId) -> bool {
        let changed = self.view_mut(grid).prev_page();
        self.view_changed(grid, changed)
    }

    // -------------------------------------------------------------------------
    // Report
    // -------------------------------------------------------------------------

    /// Snapshot the visible page of every visible grid.
    pub fn compose_report(&self) -> ReportRegion {
        let grids = self
            .visible_grids()
            .into_iter()
            .map(|grid| GridSnapshot::capture(grid.title(), self.headers(grid), &self.page(grid)))
            .collect();
        ReportRegion {
            title: REPORT_TITLE.to_string(),
            selected_key: self.selection.current().map(|k| k.to_string()),
            grids,
        }
    }

    /// Hand the composed report to an export surface.
    ///
    /// Failures are logged and returned; session state is left as it was.
    pub fn export(
        &mut self,
        surface: &mut dyn ExportSurface,
        options: &ExportOptions,
    ) -> Result<ExportReceipt, ExportError> {
        let result = if self.is_awaiting_data() {
            Err(ExportError::NothingToExport)
        } else {
            surface.export(&self.compose_report(), options)
        };
        match &result {
            Ok(receipt) => log::info!(
                "exported {} grid(s), {} row(s) to {}",
                receipt.grids,
                receipt.rows,
                receipt.path.display()
            ),
            Err(e) => log::error!("export failed: {}", e),
        }
        self.emit(SessionEvent::ExportFinished { ok: result.is_ok() });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCollector;
    use crate::filter::EmptyResultNotice;
    use budgetgrid_core::cell::CellValue;
    use budgetgrid_core::row;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn budget_workbook() -> Workbook {
        Workbook::new(vec![
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
            SheetTable::new(
                "Asignación_ManoObra",
                vec![row!["Code", "Worker"], row!["A1", "Mason"], row!["A1", "Helper"]],
            ),
        ])
    }

    fn loaded() -> ReportSession {
        let mut session = ReportSession::default();
        session.replace_workbook(budget_workbook());
        session
    }

    fn collect(session: &mut ReportSession) -> Rc<RefCell<EventCollector>> {
        let collector = Rc::new(RefCell::new(EventCollector::new()));
        let sink = Rc::clone(&collector);
        session.subscribe(Box::new(move |e| sink.borrow_mut().push(e.clone())));
        collector
    }

    struct RecordingSurface {
        regions: Vec<ReportRegion>,
        fail: bool,
    }

    impl ExportSurface for RecordingSurface {
        fn export(
            &mut self,
            region: &ReportRegion,
            options: &ExportOptions,
        ) -> Result<ExportReceipt, ExportError> {
            if self.fail {
                return Err(ExportError::Surface("disk full".into()));
            }
            self.regions.push(region.clone());
            Ok(ExportReceipt {
                path: PathBuf::from(&options.file_name),
                grids: region.grids.len(),
                rows: region.row_count(),
            })
        }
    }

    #[test]
    fn awaiting_data_before_first_workbook() {
        let session = ReportSession::default();
        assert!(session.is_awaiting_data());
        let page = session.master_page();
        assert!(page.is_empty());
        assert_eq!(page.notice, Some(EmptyResultNotice::NoMatches));
        assert!(session.headers(GridId::Master).is_empty());
    }

    #[test]
    fn selecting_master_row_filters_details() {
        let mut session = loaded();
        session.select_row(Some(RowKey::text("A1")));

        let materials = session.detail_page(DetailGrid::Materials);
        assert_eq!(materials.rows, vec![&row!["A1", "Bag"]]);

        let labor = session.detail_page(DetailGrid::Labor);
        assert_eq!(labor.total_filtered, 2);
    }

    #[test]
    fn no_selection_details_show_notice() {
        let session = loaded();
        let page = session.detail_page(DetailGrid::Materials);
        assert_eq!(page.notice, Some(EmptyResultNotice::NoSelection));
        assert_eq!(session.visible_grids(), vec![GridId::Master]);
    }

    #[test]
    fn select_master_row_uses_visible_order() {
        let mut session = loaded();
        session.toggle_sort(GridId::Master, 2);
        let change = session.select_master_row(0);
        assert!(matches!(
            change,
            Some(SelectionChange::Selected { ref current, .. }) if *current == RowKey::text("A2")
        ));
        assert_eq!(session.select_master_row(9), None);
    }

    #[test]
    fn reselecting_same_key_emits_nothing() {
        let mut session = loaded();
        let events = collect(&mut session);
        assert!(session.select_row(Some(RowKey::text("A1"))).is_some());
        assert!(session.select_row(Some(RowKey::text("A1"))).is_none());
        assert_eq!(events.borrow().selection_changes().len(), 1);
    }

    #[test]
    fn empty_key_row_clears_selection() {
        let mut session = ReportSession::default();
        session.replace_workbook(Workbook::new(vec![SheetTable::new(
            "Presupuesto_General",
            vec![
                row!["Code", "Description"],
                Row::new(vec![CellValue::Empty, CellValue::text("Orphan")]),
            ],
        )]));
        session.select_row(Some(RowKey::text("A1")));
        let change = session.select_master_row(0);
        assert!(matches!(change, Some(SelectionChange::Cleared { .. })));
        assert!(session.selection().is_none());
    }

    #[test]
    fn reimport_clears_selection_and_detail_views() {
        let mut session = loaded();
        session.set_filter(GridId::Master, 1, "a");
        session.toggle_sort(GridId::Master, 2);
        session.set_page(GridId::Master, 2);
        session.select_row(Some(RowKey::text("A1")));
        session.set_filter(GridId::Materials, 1, "bag");

        let events = collect(&mut session);
        session.replace_workbook(budget_workbook());

        assert!(session.selection().is_none());
        assert_eq!(session.view(GridId::Materials), &GridViewState::default());
        assert_eq!(session.view(GridId::Master).page(), 1);
        assert_eq!(session.view(GridId::Master).filter(1), Some("a"));
        assert!(session.view(GridId::Master).sort().is_some());

        let events = events.borrow();
        assert_eq!(events.selection_changes().len(), 1);
        assert_eq!(events.workbook_replacements(), 1);
    }

    #[test]
    fn clearing_selection_resets_detail_views() {
        let mut session = loaded();
        session.select_row(Some(RowKey::text("A1")));
        session.toggle_sort(GridId::Labor, 1);
        session.select_row(Some(RowKey::text("A2")));
        assert!(session.view(GridId::Labor).sort().is_some());

        session.clear_selection();
        assert_eq!(session.view(GridId::Labor).sort(), None);
    }

    #[test]
    fn missing_sheets_are_warned_not_fatal() {
        let mut session = ReportSession::default();
        let missing = session.replace_workbook(Workbook::new(vec![SheetTable::new(
            "Presupuesto_General",
            vec![row!["Code"], row!["A1"]],
        )]));
        let grids: Vec<GridId> = missing.iter().map(|m| m.grid).collect();
        assert_eq!(grids, vec![GridId::Materials, GridId::Labor]);

        session.select_row(Some(RowKey::text("A1")));
        let page = session.detail_page(DetailGrid::Materials);
        assert!(page.is_empty());
        assert_eq!(page.notice, Some(EmptyResultNotice::NoMatches));
    }

    #[test]
    fn view_mutations_emit_only_on_change() {
        let mut session = loaded();
        let events = collect(&mut session);
        assert!(session.set_filter(GridId::Master, 1, "s"));
        assert!(!session.set_filter(GridId::Master, 1, "s"));
        assert!(!session.prev_page(GridId::Master));
        assert!(session.toggle_sort(GridId::Materials, 0));
        assert_eq!(
            events.borrow().views_changed(),
            vec![GridId::Master, GridId::Materials]
        );
    }

    #[test]
    fn next_page_stops_at_last_page() {
        let mut session = ReportSession::new(SheetRoles::default(), 1);
        session.replace_workbook(budget_workbook());
        assert!(session.next_page(GridId::Master));
        assert!(!session.next_page(GridId::Master));
        assert_eq!(session.view(GridId::Master).page(), 2);
    }

    #[test]
    fn compose_report_includes_details_only_when_selected() {
        let mut session = loaded();
        assert_eq!(session.compose_report().grids.len(), 1);

        session.select_row(Some(RowKey::text("A1")));
        let region = session.compose_report();
        let titles: Vec<&str> = region.grids.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Items del Presupuesto", "Materiales", "Mano de Obra"]);
        assert_eq!(region.selected_key.as_deref(), Some("A1"));
        assert_eq!(region.title, REPORT_TITLE);
    }

    #[test]
    fn export_failure_leaves_state_untouched() {
        let mut session = loaded();
        session.select_row(Some(RowKey::text("A1")));
        let events = collect(&mut session);

        let mut surface = RecordingSurface { regions: vec![], fail: true };
        assert!(session.export(&mut surface, &ExportOptions::default()).is_err());
        assert_eq!(session.selection(), Some(&RowKey::text("A1")));

        surface.fail = false;
        let receipt = session.export(&mut surface, &ExportOptions::default()).unwrap();
        assert_eq!(receipt.grids, 3);
        assert_eq!(receipt.rows, 2 + 1 + 2);
        assert_eq!(
            events.borrow().events(),
            &[
                SessionEvent::ExportFinished { ok: false },
                SessionEvent::ExportFinished { ok: true }
            ]
        );
    }

    #[test]
    fn export_without_workbook_fails() {
        let mut session = ReportSession::default();
        let mut surface = RecordingSurface { regions: vec![], fail: false };
        let err = session.export(&mut surface, &ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::NothingToExport));
        assert!(surface.regions.is_empty());
    }
}
