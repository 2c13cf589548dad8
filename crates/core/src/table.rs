//! One table instance: a grid composed with its filter, pager, selection
//! store, and editor.
//!
//! This is the state behind a rendered table. It owns derivation order:
//! filter narrows the data rows to visible positions, the pager windows
//! those positions, and selection/editing address original indices
//! translated through the visible mapping. Committed edits are returned
//! as intents; applying them (locally or remotely) is the owner's call.

use crate::editor::{EditIntent, EditTarget, Editor};
use crate::filter::{FilterState, VisibleRows};
use crate::grid::Grid;
use crate::pager::Pager;
use crate::selection::{Selection, SelectionStore};

#[derive(Debug)]
pub struct TableState {
    grid: Grid,
    filter: FilterState,
    visible: VisibleRows,
    pager: Pager,
    selection: SelectionStore,
    editor: Editor,
}

impl TableState {
    /// Table with an internally owned (uncontrolled) selection.
    pub fn new(grid: Grid) -> Self {
        Self::with_selection_store(grid, SelectionStore::default())
    }

    /// Table whose selection lives in `store` (controlled mode; the
    /// workbench passes a per-file store so selections survive switching
    /// between files).
    pub fn with_selection_store(grid: Grid, store: SelectionStore) -> Self {
        let filter = FilterState::default();
        let visible = filter.apply(&grid);
        Self {
            grid,
            filter,
            visible,
            pager: Pager::default(),
            selection: store,
            editor: Editor::default(),
        }
    }

    fn refresh_view(&mut self) {
        self.visible = self.filter.apply(&self.grid);
    }

    // ── Grid access ──

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn headers(&self) -> Vec<String> {
        self.grid.headers()
    }

    pub fn cell(&self, original_row: usize, col: usize) -> &str {
        self.grid.cell(original_row, col)
    }

    /// Replace the grid wholesale (server reconciliation does this).
    /// Filter and pager carry over; the pager clamps on read and stale
    /// selection indices are tolerated by design.
    pub fn set_grid(&mut self, grid: Grid) {
        self.grid = grid;
        self.refresh_view();
    }

    // ── Filtering ──

    pub fn search(&self) -> &str {
        &self.filter.search
    }

    pub fn set_search(&mut self, text: String) {
        self.filter.search = text;
        self.refresh_view();
    }

    pub fn column_filter(&self, col: usize) -> Option<&str> {
        self.filter.column_filters.get(&col).map(String::as_str)
    }

    pub fn set_column_filter(&mut self, col: usize, needle: String) {
        self.filter.set_column_filter(col, needle);
        self.refresh_view();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.refresh_view();
    }

    pub fn filter_active(&self) -> bool {
        !self.filter.is_identity()
    }

    /// Visible data rows after filtering, before paging.
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Original indices of every visible data row, in view order.
    pub fn visible_rows(&self) -> &[usize] {
        self.visible.as_slice()
    }

    pub fn total_data_rows(&self) -> usize {
        self.grid.data_row_count()
    }

    // ── Paging ──

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Original data-row indices on the current page, in view order.
    pub fn page_rows(&self) -> &[usize] {
        &self.visible.as_slice()[self.pager.page_range(self.visible.len())]
    }

    pub fn current_page(&self) -> usize {
        self.pager.current_page(self.visible.len())
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.visible.len())
    }

    pub fn first_page(&mut self) {
        self.pager.first_page();
    }

    pub fn prev_page(&mut self) {
        self.pager.prev_page(self.visible.len());
    }

    pub fn next_page(&mut self) {
        self.pager.next_page(self.visible.len());
    }

    pub fn last_page(&mut self) {
        self.pager.last_page(self.visible.len());
    }

    pub fn set_rows_per_page(&mut self, n: usize) {
        self.pager.set_rows_per_page(n);
    }

    pub fn cycle_rows_per_page(&mut self, forward: bool) {
        self.pager.cycle_rows_per_page(forward);
    }

    /// Numbers for the "Showing X to Y of Z entries" line.
    pub fn showing(&self) -> (usize, usize, usize) {
        self.pager.showing(self.visible.len())
    }

    // ── Selection ──

    pub fn selection(&self) -> Selection {
        self.selection.snapshot()
    }

    pub fn row_selected(&self, original_row: usize) -> bool {
        self.selection.with(|s| s.row_selected(original_row))
    }

    pub fn column_selected(&self, col: usize) -> bool {
        self.selection.with(|s| s.column_selected(col))
    }

    pub fn selected_count(&self) -> usize {
        self.selection.with(|s| s.rows.len())
    }

    pub fn toggle_row(&mut self, original_row: usize) {
        self.selection.update(|s| s.toggle_row(original_row));
    }

    pub fn toggle_column(&mut self, col: usize) {
        self.selection.update(|s| s.toggle_column(col));
    }

    /// Select-all toggle scoped to the current page.
    pub fn toggle_page_selection(&mut self) {
        let page: Vec<usize> = self.page_rows().to_vec();
        self.selection.update(|s| s.toggle_page_rows(&page));
    }

    pub fn page_fully_selected(&self) -> bool {
        let page = self.page_rows();
        self.selection.with(|s| s.page_fully_selected(page))
    }

    pub fn clear_selection(&mut self) {
        self.selection.update(Selection::clear);
    }

    // ── Editing ──

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    /// Begin editing a data cell, addressed by original row index (the
    /// caller translates a view position via `page_rows`).
    pub fn begin_cell_edit(&mut self, original_row: usize, col: usize) {
        let current = self.grid.cell(original_row, col).to_string();
        self.editor
            .begin(EditTarget::Cell { row: original_row, col }, &current);
    }

    pub fn begin_header_edit(&mut self, col: usize) {
        let current = self
            .headers()
            .get(col)
            .cloned()
            .unwrap_or_default();
        self.editor.begin(EditTarget::Header { col }, &current);
    }

    /// Commit the open edit, if any, and hand the intent to the owner.
    pub fn commit_edit(&mut self) -> Option<EditIntent> {
        self.editor.commit()
    }

    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
    }

    /// Apply a (confirmed or optimistic) edit to the grid and re-derive
    /// the view, since the edit may change what the filter matches.
    pub fn apply_edit(&mut self, intent: &EditIntent) {
        match intent.target {
            EditTarget::Cell { row, col } => {
                self.grid.set_cell(row, col, intent.value.clone());
            }
            EditTarget::Header { col } => {
                self.grid.set_header(col, intent.value.clone());
            }
        }
        self.refresh_view();
    }
}
