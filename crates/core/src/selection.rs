//! Master-row selection.
//!
//! Holds the zero-or-one selected [`RowKey`] and notifies subscribers
//! synchronously whenever the selection actually changes. Re-selecting the
//! current key is a silent no-op.

use crate::key::RowKey;

/// A change to the selected master row.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    /// A key became selected (`previous` is what it replaced, if anything).
    Selected {
        previous: Option<RowKey>,
        current: RowKey,
    },
    /// The selection was cleared.
    Cleared { previous: RowKey },
}

/// Callback type for selection subscribers.
pub type SelectionCallback = Box<dyn FnMut(&SelectionChange)>;

#[derive(Default)]
pub struct SelectionController {
    current: Option<RowKey>,
    subscribers: Vec<SelectionCallback>,
}

impl std::fmt::Debug for SelectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionController")
            .field("current", &self.current)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected key, if any.
    pub fn current(&self) -> Option<&RowKey> {
        self.current.as_ref()
    }

    pub fn has_selection(&self) -> bool {
        self.current.is_some()
    }

    /// Register a subscriber. Subscribers run in registration order.
    pub fn subscribe(&mut self, callback: SelectionCallback) {
        self.subscribers.push(callback);
    }

    /// Select `key`, or clear the selection with `None`.
    ///
    /// Returns the change that was applied, or `None` if the selection was
    /// already in the requested state.
    pub fn select(&mut self, key: Option<RowKey>) -> Option<SelectionChange> {
        if self.current == key {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, key.clone());
        let change = match (previous, key) {
            (previous, Some(current)) => SelectionChange::Selected { previous, current },
            (Some(previous), None) => SelectionChange::Cleared { previous },
            (None, None) => return None,
        };
        self.notify(&change);
        Some(change)
    }

    /// Clear the selection. No-op when nothing is selected.
    pub fn clear(&mut self) -> Option<SelectionChange> {
        self.select(None)
    }

    fn notify(&mut self, change: &SelectionChange) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber(change);
        }
    }
}
