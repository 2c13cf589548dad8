//! String-cell grid with a conventional header row.
//!
//! Key invariants:
//! - Row 0 is the header row; data rows are addressed 0..N-1 below it
//! - Rectangularity is a convention, not an invariant: short and long
//!   rows are legal, and missing cells read as ""
//! - All mutation is explicit; filtering and rendering never write back

use serde::{Deserialize, Serialize};

/// A parsed tabular file: rows of string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Grid with no rows at all (not even a header).
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, header included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// Header cells from row 0.
    ///
    /// An empty grid has no headers. A present-but-empty first row falls
    /// back to the single placeholder header "Column 1".
    pub fn headers(&self) -> Vec<String> {
        match self.rows.first() {
            None => Vec::new(),
            Some(first) if first.is_empty() => vec!["Column 1".to_string()],
            Some(first) => first.clone(),
        }
    }

    /// Number of rendered columns, driven by the header row.
    pub fn column_count(&self) -> usize {
        self.headers().len()
    }

    /// Data rows (everything below the header).
    pub fn data_rows(&self) -> &[Vec<String>] {
        if self.rows.is_empty() {
            &[]
        } else {
            &self.rows[1..]
        }
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// Cell at (data row, column); "" when either index is out of range.
    pub fn cell(&self, data_row: usize, col: usize) -> &str {
        self.rows
            .get(data_row + 1)
            .and_then(|row| row.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Write a data cell, padding a short row with "" up to the column.
    /// Out-of-range rows are ignored (the row set never grows here).
    pub fn set_cell(&mut self, data_row: usize, col: usize, value: String) {
        if let Some(row) = self.rows.get_mut(data_row + 1) {
            if row.len() <= col {
                row.resize(col + 1, String::new());
            }
            row[col] = value;
        }
    }

    /// Write a header cell, padding like `set_cell`. A grid with no rows
    /// has no header to write to and is left unchanged.
    pub fn set_header(&mut self, col: usize, value: String) {
        if let Some(row) = self.rows.first_mut() {
            if row.len() <= col {
                row.resize(col + 1, String::new());
            }
            row[col] = value;
        }
    }
}
