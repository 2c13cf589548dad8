//! Fixed-size pagination over a (possibly filtered) row set.
//!
//! Pages are 1-based. The stored page number survives row-set changes;
//! every read clamps it into `[1, total_pages]`, so shrinking the row set
//! lands on the last valid page instead of an empty window.

use serde::{Deserialize, Serialize};

/// Page sizes offered by the view layer.
pub const ROWS_PER_PAGE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

const DEFAULT_ROWS_PER_PAGE: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    rows_per_page: usize,
    /// 1-based; may exceed the current total, clamped on read.
    page: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            page: 1,
        }
    }
}

impl Pager {
    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Always at least 1, even for an empty row set.
    pub fn total_pages(&self, total_rows: usize) -> usize {
        total_rows.div_ceil(self.rows_per_page).max(1)
    }

    /// The stored page clamped into `[1, total_pages]`.
    pub fn current_page(&self, total_rows: usize) -> usize {
        self.page.clamp(1, self.total_pages(total_rows))
    }

    /// Half-open index range of the current page within the row set.
    pub fn page_range(&self, total_rows: usize) -> std::ops::Range<usize> {
        let start = (self.current_page(total_rows) - 1) * self.rows_per_page;
        let end = (start + self.rows_per_page).min(total_rows);
        start..end
    }

    /// Change the page size and reset to page 1. Values outside
    /// `ROWS_PER_PAGE_OPTIONS` are ignored (the selector is closed).
    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        if ROWS_PER_PAGE_OPTIONS.contains(&rows_per_page) {
            self.rows_per_page = rows_per_page;
            self.page = 1;
        }
    }

    /// Cycle to the next / previous option in `ROWS_PER_PAGE_OPTIONS`.
    pub fn cycle_rows_per_page(&mut self, forward: bool) {
        let i = ROWS_PER_PAGE_OPTIONS
            .iter()
            .position(|&n| n == self.rows_per_page)
            .unwrap_or(0);
        let next = if forward {
            (i + 1).min(ROWS_PER_PAGE_OPTIONS.len() - 1)
        } else {
            i.saturating_sub(1)
        };
        self.set_rows_per_page(ROWS_PER_PAGE_OPTIONS[next]);
    }

    pub fn set_page(&mut self, page: usize, total_rows: usize) {
        self.page = page.clamp(1, self.total_pages(total_rows));
    }

    pub fn first_page(&mut self) {
        self.page = 1;
    }

    pub fn prev_page(&mut self, total_rows: usize) {
        self.page = self.current_page(total_rows).saturating_sub(1).max(1);
    }

    pub fn next_page(&mut self, total_rows: usize) {
        let total = self.total_pages(total_rows);
        self.page = (self.current_page(total_rows) + 1).min(total);
    }

    pub fn last_page(&mut self, total_rows: usize) {
        self.page = self.total_pages(total_rows);
    }

    pub fn can_prev(&self, total_rows: usize) -> bool {
        self.current_page(total_rows) > 1
    }

    pub fn can_next(&self, total_rows: usize) -> bool {
        self.current_page(total_rows) < self.total_pages(total_rows)
    }

    /// Numbers for the "Showing X to Y of Z entries" line. An empty row
    /// set reads "Showing 1 to 0 of 0", matching the rendered original.
    pub fn showing(&self, total_rows: usize) -> (usize, usize, usize) {
        let range = self.page_range(total_rows);
        (range.start + 1, range.end, total_rows)
    }
}
