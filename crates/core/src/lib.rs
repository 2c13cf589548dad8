//! In-memory tabular view state.
//!
//! Pure state crate: grids of string cells, substring filtering with a
//! stable mapping back to original row indices, pagination, row/column
//! selection, and single-slot edit intents. No IO or network dependencies.

pub mod editor;
pub mod filter;
pub mod grid;
pub mod pager;
pub mod selection;
pub mod table;

pub use editor::{EditIntent, EditTarget, Editor};
pub use filter::{FilterState, VisibleRows};
pub use grid::Grid;
pub use pager::{Pager, ROWS_PER_PAGE_OPTIONS};
pub use selection::{Selection, SelectionStore};
pub use table::TableState;
