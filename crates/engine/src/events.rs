//! Event types for session change notifications.
//!
//! Front-ends subscribe to these instead of polling the session after every
//! key press. Tests use [`EventCollector`] to check which events a sequence
//! of session calls produced, and in what order.

use budgetgrid_core::selection::SelectionChange;

use crate::session::{GridId, MissingSheetWarning};

/// Events emitted by [`ReportSession`](crate::session::ReportSession).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new workbook was installed. Selection is cleared at this point.
    WorkbookReplaced {
        /// Number of sheets in the new workbook.
        sheets: usize,
        /// Sheet roles that the new workbook does not provide.
        missing: Vec<MissingSheetWarning>,
    },

    /// The selected master row changed.
    SelectionChanged(SelectionChange),

    /// Filter, sort or page of one grid changed.
    ViewChanged(GridId),

    /// An export attempt finished.
    ExportFinished { ok: bool },
}

/// Callback type for receiving session events.
pub type EventCallback = Box<dyn FnMut(&SessionEvent)>;

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<SessionEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only SelectionChanged events.
    pub fn selection_changes(&self) -> Vec<&SelectionChange> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::SelectionChanged(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Grids named by ViewChanged events, in emission order.
    pub fn views_changed(&self) -> Vec<GridId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::ViewChanged(grid) => Some(*grid),
                _ => None,
            })
            .collect()
    }

    /// Count of WorkbookReplaced events.
    pub fn workbook_replacements(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SessionEvent::WorkbookReplaced { .. }))
            .count()
    }
}
