//! Search and per-column filtering over a grid's data rows.
//!
//! This module maps between:
//! - View space (filtered positions, what gets paged and rendered)
//! - Data space (original data-row indices, what edits and selections use)
//!
//! Key invariants:
//! - The header row never participates in matching
//! - Matching is case-insensitive substring containment on trimmed needles
//! - A needle that is empty after trimming is inactive
//! - With nothing active, `apply` is the identity mapping
//! - `VisibleRows` positions are ascending data-row indices

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

// =============================================================================
// FilterState
// =============================================================================

/// Free-text search plus per-column substring filters.
///
/// Pure data: deriving the visible row set is a function of
/// (grid, FilterState) with no hidden state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Matches a row when ANY of its cells contains the needle.
    pub search: String,
    /// column index -> needle; all active entries must match (AND).
    pub column_filters: BTreeMap<usize, String>,
}

impl FilterState {
    /// True when no search text and no column filter is active.
    pub fn is_identity(&self) -> bool {
        normalize(&self.search).is_none()
            && self.column_filters.values().all(|v| normalize(v).is_none())
    }

    /// Set the column filter for `col`; an empty needle clears it.
    pub fn set_column_filter(&mut self, col: usize, needle: String) {
        if needle.trim().is_empty() {
            self.column_filters.remove(&col);
        } else {
            self.column_filters.insert(col, needle);
        }
    }

    pub fn clear(&mut self) {
        self.search.clear();
        self.column_filters.clear();
    }

    /// Whether a single data row passes the search and every column filter.
    pub fn row_matches(&self, row: &[String]) -> bool {
        if let Some(needle) = normalize(&self.search) {
            let hit = row.iter().any(|cell| contains_ci(cell, &needle));
            if !hit {
                return false;
            }
        }
        for (&col, raw) in &self.column_filters {
            if let Some(needle) = normalize(raw) {
                let cell = row.get(col).map(String::as_str).unwrap_or("");
                if !contains_ci(cell, &needle) {
                    return false;
                }
            }
        }
        true
    }

    /// Derive the visible data rows for `grid`.
    pub fn apply(&self, grid: &Grid) -> VisibleRows {
        let total = grid.data_row_count();
        if self.is_identity() {
            return VisibleRows::identity(total);
        }
        let positions = grid
            .data_rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| self.row_matches(row))
            .map(|(i, _)| i)
            .collect();
        VisibleRows { positions }
    }
}

/// Trim + lowercase a needle; `None` means inactive.
fn normalize(needle: &str) -> Option<String> {
    let trimmed = needle.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Case-insensitive containment; `needle` is already lowercased.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// =============================================================================
// VisibleRows: view position -> original data-row index
// =============================================================================

/// The filtered row set, as ascending original data-row indices.
///
/// Position `p` in the view corresponds to data row `positions[p]`.
/// Edits and selections address data rows, so every consumer that walks
/// the view translates through this mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRows {
    positions: Vec<usize>,
}

impl VisibleRows {
    /// Identity mapping over `total` data rows.
    pub fn identity(total: usize) -> Self {
        Self {
            positions: (0..total).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Original data-row index for a view position.
    pub fn original_index(&self, pos: usize) -> Option<usize> {
        self.positions.get(pos).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.positions
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn fruit_grid() -> Grid {
        grid(&[
            &["name", "color", "count"],
            &["Apple", "red", "3"],
            &["Banana", "yellow", "12"],
            &["Cherry", "red", "40"],
            &["Plum", "purple", "7"],
        ])
    }

    #[test]
    fn test_no_filters_is_identity() {
        let g = fruit_grid();
        let f = FilterState::default();
        assert!(f.is_identity());
        let v = f.apply(&g);
        assert_eq!(v.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_whitespace_needles_are_inactive() {
        let g = fruit_grid();
        let mut f = FilterState::default();
        f.search = "   ".into();
        f.column_filters.insert(1, "  ".into());
        assert!(f.is_identity());
        assert_eq!(f.apply(&g).len(), 4);
    }

    #[test]
    fn test_search_matches_any_cell_case_insensitive() {
        let g = fruit_grid();
        let f = FilterState {
            search: "RED".into(),
            ..Default::default()
        };
        let v = f.apply(&g);
        assert_eq!(v.as_slice(), &[0, 2]); // Apple, Cherry
    }

    #[test]
    fn test_search_does_not_match_header() {
        let g = fruit_grid();
        let f = FilterState {
            search: "color".into(),
            ..Default::default()
        };
        assert!(f.apply(&g).is_empty());
    }

    #[test]
    fn test_column_filter_targets_one_column() {
        let g = fruit_grid();
        let mut f = FilterState::default();
        // "red" appears in column 1 of rows 0 and 2 only
        f.set_column_filter(0, "red".into());
        assert!(f.apply(&g).is_empty());
        f.clear();
        f.set_column_filter(1, "red".into());
        assert_eq!(f.apply(&g).as_slice(), &[0, 2]);
    }

    #[test]
    fn test_filters_and_search_compose_with_and() {
        let g = fruit_grid();
        let mut f = FilterState {
            search: "a".into(), // Apple, Banana
            ..Default::default()
        };
        f.set_column_filter(1, "red".into()); // Apple, Cherry
        assert_eq!(f.apply(&g).as_slice(), &[0]); // Apple only
        f.set_column_filter(2, "99".into());
        assert!(f.apply(&g).is_empty());
    }

    #[test]
    fn test_column_filter_out_of_range_reads_empty_cell() {
        let g = fruit_grid();
        let mut f = FilterState::default();
        f.set_column_filter(9, "x".into());
        assert!(f.apply(&g).is_empty());
    }

    #[test]
    fn test_setting_empty_filter_clears_entry() {
        let mut f = FilterState::default();
        f.set_column_filter(2, "7".into());
        assert_eq!(f.column_filters.len(), 1);
        f.set_column_filter(2, "".into());
        assert!(f.column_filters.is_empty());
    }

    #[test]
    fn test_visible_rows_mapping() {
        let v = VisibleRows {
            positions: vec![3, 5, 9],
        };
        assert_eq!(v.original_index(0), Some(3));
        assert_eq!(v.original_index(2), Some(9));
        assert_eq!(v.original_index(3), None);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_identity_mapping_is_ordered() {
        let v = VisibleRows::identity(4);
        assert_eq!(v.as_slice(), &[0, 1, 2, 3]);
        assert!(VisibleRows::identity(0).is_empty());
    }
}
