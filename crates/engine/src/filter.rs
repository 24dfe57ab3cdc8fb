//! Grid presentation pipeline: filter, sort, paginate.
//!
//! Every displayed grid owns a [`GridViewState`]. Presenting a grid runs its
//! rows through three fixed stages:
//!
//! 1. Filter: per-column, case-folded substring match on display text
//! 2. Sort: numeric when both cells are numeric, collated text otherwise
//! 3. Paginate: 1-based page window of `page_size` rows
//!
//! Key invariants:
//! - Stages never reorder rows except in the sort stage
//! - Sorting is stable, in both directions
//! - Changing a filter or the sort always returns the grid to page 1
//! - Page size is fixed for the lifetime of a view state

use std::cmp::Ordering;
use std::collections::BTreeMap;

use budgetgrid_core::cell::{CellValue, Row};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::collate;

/// Rows per page when a grid does not say otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 5;

// =============================================================================
// View state
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Arrow shown next to a sorted header.
    pub fn arrow(self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

/// Current sort state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

/// Case-insensitive "contains" predicate for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFilter {
    pub value: String,
}

impl TextFilter {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.value.to_lowercase())
    }
}

/// Filter, sort and page state of a single grid.
///
/// Not shared between grids: the master grid and each detail grid own one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridViewState {
    /// Per-column filter text, keyed by column index. Only set columns present.
    column_filters: BTreeMap<usize, TextFilter>,
    sort: Option<SortState>,
    /// 1-based
    page: usize,
    page_size: usize,
}

impl Default for GridViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl GridViewState {
    /// Fresh state: no filters, unsorted, page 1. A zero page size becomes 1.
    pub fn new(page_size: usize) -> Self {
        Self {
            column_filters: BTreeMap::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Back to a fresh state with the same page size.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    /// Filter text for a column, if one is set.
    pub fn filter(&self, col: usize) -> Option<&str> {
        self.column_filters.get(&col).map(|f| f.value.as_str())
    }

    /// Active column filters in column order.
    pub fn filters(&self) -> impl Iterator<Item = (usize, &TextFilter)> {
        self.column_filters.iter().map(|(col, f)| (*col, f))
    }

    pub fn has_active_filter(&self) -> bool {
        self.column_filters.values().any(|f| f.is_active())
    }

    /// Set the filter text for a column. Empty text removes the filter.
    ///
    /// Returns true if the filter changed; any change resets to page 1.
    pub fn set_filter(&mut self, col: usize, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.filter(col).unwrap_or("") == text {
            return false;
        }
        if text.is_empty() {
            self.column_filters.remove(&col);
        } else {
            self.column_filters.insert(col, TextFilter::new(text));
        }
        self.page = 1;
        true
    }

    /// Remove every column filter (keeps sort). Returns true if any was set.
    pub fn clear_filters(&mut self) -> bool {
        if self.column_filters.is_empty() {
            return false;
        }
        self.column_filters.clear();
        self.page = 1;
        true
    }

    /// Header click: flip direction on the sorted column, otherwise sort the
    /// new column ascending.
    pub fn toggle_sort(&mut self, col: usize) -> SortState {
        let next = match self.sort {
            Some(state) if state.column == col => SortState {
                column: col,
                direction: state.direction.flipped(),
            },
            _ => SortState {
                column: col,
                direction: SortDirection::Ascending,
            },
        };
        self.sort = Some(next);
        self.page = 1;
        next
    }

    /// Back to source order. Returns true if a sort was active.
    pub fn clear_sort(&mut self) -> bool {
        if self.sort.take().is_none() {
            return false;
        }
        self.page = 1;
        true
    }

    /// Sort arrow for a header cell ("" when the column is not sorted).
    pub fn sort_indicator(&self, col: usize) -> &'static str {
        match self.sort {
            Some(state) if state.column == col => state.direction.arrow(),
            _ => "",
        }
    }

    /// Jump to a page. Page 0 is treated as page 1; pages past the end are
    /// kept as-is (the grid then shows an empty window).
    pub fn set_page(&mut self, page: usize) -> bool {
        let page = page.max(1);
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    /// Advance one page, stopping at `page_count`.
    pub fn next_page(&mut self, page_count: usize) -> bool {
        if self.page >= page_count {
            return false;
        }
        self.set_page(self.page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.set_page(self.page - 1)
    }
}

// =============================================================================
// Presented page
// =============================================================================

/// Why a presented grid has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyResultNotice {
    /// Filters (or an empty source) left zero rows.
    NoMatches,
    /// Rows exist, but the requested page is past the last one.
    PageOutOfRange,
    /// A dependent grid with no master row selected.
    NoSelection,
}

impl EmptyResultNotice {
    pub fn message(self) -> &'static str {
        match self {
            EmptyResultNotice::NoMatches => "No results",
            EmptyResultNotice::PageOutOfRange => "No rows on this page",
            EmptyResultNotice::NoSelection => "Select a row to see details",
        }
    }
}

/// Output of the pipeline for one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPage<'a> {
    /// Rows in the active page window, in display order.
    pub rows: Vec<&'a Row>,
    /// Row count after filtering, before slicing.
    pub total_filtered: usize,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
    /// Set whenever `rows` is empty.
    pub notice: Option<EmptyResultNotice>,
}

impl<'a> GridPage<'a> {
    /// Empty page for a dependent grid with nothing selected.
    pub fn awaiting_selection(view: &GridViewState) -> Self {
        Self {
            rows: Vec::new(),
            total_filtered: 0,
            page: view.page(),
            page_size: view.page_size(),
            notice: Some(EmptyResultNotice::NoSelection),
        }
    }

    /// Total pages, never less than 1.
    pub fn page_count(&self) -> usize {
        page_count(self.total_filtered, self.page_size)
    }

    /// 1-based position of the first visible row in the filtered sequence.
    pub fn first_position(&self) -> Option<usize> {
        if self.rows.is_empty() {
            None
        } else {
            Some((self.page - 1) * self.page_size + 1)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pages needed for `total` rows: `max(1, ceil(total / page_size))`.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

// =============================================================================
// Pipeline stages
// =============================================================================

/// Filter stage: keep rows where every active filter on a column inside the
/// header matches that cell's display text.
pub fn filter_rows<'a, I>(column_count: usize, rows: I, view: &GridViewState) -> Vec<&'a Row>
where
    I: IntoIterator<Item = &'a Row>,
{
    let active: Vec<(usize, &TextFilter)> = view
        .filters()
        .filter(|(col, f)| *col < column_count && f.is_active())
        .collect();

    rows.into_iter()
        .filter(|row| active.iter().all(|(col, f)| f.matches(&row.text(*col))))
        .collect()
}

/// Compare two cells for sorting (ascending).
///
/// Both numeric: numeric order. Otherwise: collated display text. A mixed
/// column therefore compares numbers numerically among themselves and
/// textually against words.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => OrderedFloat(x).cmp(&OrderedFloat(y)),
        _ => collate::compare_text(&a.display_text(), &b.display_text()),
    }
}

/// Sort stage: stable sort by one column.
pub fn sort_rows(rows: &mut Vec<&Row>, sort: SortState) {
    let col = sort.column;
    stable_sort_by(rows, |a, b| {
        let ord = compare_cells(a.cell(col), b.cell(col));
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

/// Paginate stage: rows of 1-based `page`. Out-of-range pages are empty.
pub fn paginate<'a>(rows: &[&'a Row], page: usize, page_size: usize) -> Vec<&'a Row> {
    let page_size = page_size.max(1);
    let Some(start) = page.checked_sub(1).and_then(|p| p.checked_mul(page_size)) else {
        return Vec::new();
    };
    rows.iter().skip(start).take(page_size).copied().collect()
}

/// Run the full pipeline for one grid.
pub fn present<'a, I>(headers: &Row, rows: I, view: &GridViewState) -> GridPage<'a>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut filtered = filter_rows(headers.len(), rows, view);
    if let Some(sort) = view.sort() {
        sort_rows(&mut filtered, sort);
    }

    let total_filtered = filtered.len();
    let window = paginate(&filtered, view.page(), view.page_size());
    let notice = if total_filtered == 0 {
        Some(EmptyResultNotice::NoMatches)
    } else if window.is_empty() {
        Some(EmptyResultNotice::PageOutOfRange)
    } else {
        None
    };

    log::debug!(
        "grid presented: {} filtered, page {}/{}, {} visible",
        total_filtered,
        view.page(),
        page_count(total_filtered, view.page_size()),
        window.len()
    );

    GridPage {
        rows: window,
        total_filtered,
        page: view.page(),
        page_size: view.page_size(),
        notice,
    }
}

/// Stable sort that leaves every adjacent pair in order.
///
/// Mixed text/number columns make the comparator non-transitive, so there
/// may be no total order to reach. The result only promises that no element
/// is strictly less than its left neighbour; input that already has that
/// shape is returned untouched, which makes sorting idempotent.
fn stable_sort_by<T, F>(items: &mut Vec<T>, mut cmp: F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    if is_adjacent_ordered(items, &mut cmp) {
        return;
    }
    merge_pass(items, &mut cmp);
    insertion_pass(items, &mut cmp);
}

fn is_adjacent_ordered<T, F>(items: &[T], cmp: &mut F) -> bool
where
    F: FnMut(&T, &T) -> Ordering,
{
    items.windows(2).all(|pair| cmp(&pair[1], &pair[0]) != Ordering::Less)
}

/// Bottom-up merge sort, equal elements in input order. Sorts fully when the
/// comparator is a total order.
fn merge_pass<T, F>(items: &mut Vec<T>, cmp: &mut F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }
    let mut buf = items.clone();
    let mut width = 1;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j, mut k) = (start, mid, start);
            while i < mid && j < end {
                // Take from the right run only when strictly smaller.
                if cmp(&items[j], &items[i]) == Ordering::Less {
                    buf[k] = items[j];
                    j += 1;
                } else {
                    buf[k] = items[i];
                    i += 1;
                }
                k += 1;
            }
            buf[k..k + (mid - i)].copy_from_slice(&items[i..mid]);
            k += mid - i;
            buf[k..k + (end - j)].copy_from_slice(&items[j..end]);
            start += 2 * width;
        }
        std::mem::swap(items, &mut buf);
        width *= 2;
    }
}

/// Straight insertion, moving an element left only past strictly greater
/// neighbours. Linear on merge output for total orders.
fn insertion_pass<T, F>(items: &mut [T], cmp: &mut F)
where
    T: Copy,
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let item = items[i];
        let mut j = i;
        while j > 0 && cmp(&item, &items[j - 1]) == Ordering::Less {
            items[j] = items[j - 1];
            j -= 1;
        }
        items[j] = item;
    }
}

// =============================================================================
// Tests
// =============================================================================
