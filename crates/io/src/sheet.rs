//! Spreadsheet import (xlsx, xls) via calamine.
//!
//! Only the first sheet is read; row 1 is the header by convention.
//! Every cell is coerced to text at this boundary so the grid stays a
//! uniform string table.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use custommarket_core::Grid;

use crate::error::ParseError;

/// Parse spreadsheet bytes into a grid, reading only the first sheet.
/// A workbook without sheets or with an empty first sheet yields an
/// empty grid; an undecodable container is `ParseError::Corrupt`.
pub fn parse_sheet(bytes: &[u8], filename: &str) -> Result<Grid, ParseError> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| ParseError::Corrupt {
        filename: filename.to_string(),
        reason: e.to_string(),
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first = match sheet_names.first() {
        Some(name) => name.clone(),
        None => return Ok(Grid::empty()),
    };

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| ParseError::Corrupt {
            filename: filename.to_string(),
            reason: e.to_string(),
        })?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(Grid::new(rows))
}

/// Coerce one spreadsheet cell to text. Integral floats (and date
/// serials) collapse to integer text; booleans surface as TRUE/FALSE.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => float_to_string(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => float_to_string(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn float_to_string(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
