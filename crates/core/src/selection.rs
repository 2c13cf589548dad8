//! Row and column selection, addressed in original data-row index space.
//!
//! Key invariants:
//! - Indices are original data-row / column indices, never page-local or
//!   filtered positions, so selections survive pagination and filtering
//! - Toggles are involutive: toggling twice restores the prior state
//! - Stale indices (rows no longer visible) are not an error; they simply
//!   render as not visible

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

// =============================================================================
// Selection
// =============================================================================

/// Selected rows and columns as independent index sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub rows: BTreeSet<usize>,
    pub columns: BTreeSet<usize>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.columns.is_empty()
    }

    pub fn row_selected(&self, row: usize) -> bool {
        self.rows.contains(&row)
    }

    pub fn column_selected(&self, col: usize) -> bool {
        self.columns.contains(&col)
    }

    pub fn toggle_row(&mut self, row: usize) {
        if !self.rows.remove(&row) {
            self.rows.insert(row);
        }
    }

    pub fn toggle_column(&mut self, col: usize) {
        if !self.columns.remove(&col) {
            self.columns.insert(col);
        }
    }

    /// Select-all toggle over one page of original row indices.
    ///
    /// "Fully selected" means every page index is a member (not a size
    /// comparison, which misfires across pages). Not fully selected: the
    /// row set becomes exactly the page's indices. Fully selected: the
    /// row set is cleared. Columns are untouched either way.
    pub fn toggle_page_rows(&mut self, page: &[usize]) {
        let all_selected = !page.is_empty() && page.iter().all(|r| self.rows.contains(r));
        if all_selected {
            self.rows.clear();
        } else {
            self.rows = page.iter().copied().collect();
        }
    }

    /// Whether every index on the page is selected (empty page: false).
    pub fn page_fully_selected(&self, page: &[usize]) -> bool {
        !page.is_empty() && page.iter().all(|r| self.rows.contains(r))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
    }

    /// Selected rows in ascending order.
    pub fn sorted_rows(&self) -> Vec<usize> {
        self.rows.iter().copied().collect()
    }

    /// Selected columns in ascending order.
    pub fn sorted_columns(&self) -> Vec<usize> {
        self.columns.iter().copied().collect()
    }
}

// =============================================================================
// SelectionStore: owned (uncontrolled) vs shared (controlled)
// =============================================================================

/// Where a table's selection lives.
///
/// `Owned` is the uncontrolled mode: the table owns the set and mutates
/// it directly. `Shared` is the controlled mode: the set belongs to an
/// external owner (the workbench keys one per file); every change is
/// computed on a copy and written back wholesale, never mutated in place.
#[derive(Debug, Clone)]
pub enum SelectionStore {
    Owned(Selection),
    Shared(Rc<RefCell<Selection>>),
}

impl Default for SelectionStore {
    fn default() -> Self {
        SelectionStore::Owned(Selection::default())
    }
}

impl SelectionStore {
    pub fn shared(store: Rc<RefCell<Selection>>) -> Self {
        SelectionStore::Shared(store)
    }

    /// Read access without cloning the whole set.
    pub fn with<R>(&self, f: impl FnOnce(&Selection) -> R) -> R {
        match self {
            SelectionStore::Owned(sel) => f(sel),
            SelectionStore::Shared(store) => f(&store.borrow()),
        }
    }

    /// Current state as an owned value.
    pub fn snapshot(&self) -> Selection {
        self.with(Selection::clone)
    }

    /// Apply a change. Owned state is mutated directly; shared state goes
    /// through copy-then-replace so the external owner only ever observes
    /// whole states.
    pub fn update(&mut self, f: impl FnOnce(&mut Selection)) {
        match self {
            SelectionStore::Owned(sel) => f(sel),
            SelectionStore::Shared(store) => {
                let mut next = store.borrow().clone();
                f(&mut next);
                *store.borrow_mut() = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_row_is_involutive() {
        let mut sel = Selection::default();
        sel.toggle_row(7);
        assert!(sel.row_selected(7));
        sel.toggle_row(7);
        assert!(!sel.row_selected(7));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_rows_and_columns_are_independent() {
        let mut sel = Selection::default();
        sel.toggle_row(2);
        sel.toggle_column(2);
        assert!(sel.row_selected(2));
        assert!(sel.column_selected(2));
        sel.toggle_row(2);
        assert!(sel.column_selected(2)); // column untouched
    }

    #[test]
    fn test_toggle_page_selects_exactly_page() {
        let mut sel = Selection::default();
        sel.toggle_row(99); // selection from elsewhere
        sel.toggle_page_rows(&[10, 11, 12]);
        assert_eq!(sel.sorted_rows(), vec![10, 11, 12]);
    }

    #[test]
    fn test_toggle_page_clears_when_fully_selected() {
        let mut sel = Selection::default();
        sel.toggle_page_rows(&[10, 11, 12]);
        assert!(sel.page_fully_selected(&[10, 11, 12]));
        sel.toggle_page_rows(&[10, 11, 12]);
        assert!(sel.rows.is_empty());
    }

    #[test]
    fn test_partial_page_selection_is_not_full() {
        let mut sel = Selection::default();
        sel.toggle_row(10);
        assert!(!sel.page_fully_selected(&[10, 11]));
        sel.toggle_page_rows(&[10, 11]);
        assert_eq!(sel.sorted_rows(), vec![10, 11]);
    }

    #[test]
    fn test_full_selection_on_other_page_does_not_clear() {
        // Three rows selected on one page must not satisfy "fully
        // selected" for a different page of the same size.
        let mut sel = Selection::default();
        sel.toggle_page_rows(&[0, 1, 2]);
        sel.toggle_page_rows(&[3, 4, 5]);
        assert_eq!(sel.sorted_rows(), vec![3, 4, 5]);
    }

    #[test]
    fn test_empty_page_never_fully_selected() {
        let sel = Selection::default();
        assert!(!sel.page_fully_selected(&[]));
    }

    #[test]
    fn test_owned_store_mutates_in_place() {
        let mut store = SelectionStore::default();
        store.update(|s| s.toggle_row(3));
        assert!(store.with(|s| s.row_selected(3)));
    }

    #[test]
    fn test_shared_store_writes_back_to_owner() {
        let external = Rc::new(RefCell::new(Selection::default()));
        let mut store = SelectionStore::shared(Rc::clone(&external));
        store.update(|s| s.toggle_row(5));
        assert!(external.borrow().row_selected(5));
        // a second handle over the same owner sees the change
        let other = SelectionStore::shared(Rc::clone(&external));
        assert!(other.with(|s| s.row_selected(5)));
    }
}
