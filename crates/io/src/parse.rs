//! Extension-driven parse dispatch.

use custommarket_core::Grid;

use crate::classify::file_extension;
use crate::error::ParseError;
use crate::{csv, sheet};

/// Parse a tabular file's raw content into a grid.
///
/// CSV goes through the text scanner (decoding UTF-8 with a
/// Windows-1252 fallback) and cannot fail. xlsx/xls go through
/// calamine and fail only on an undecodable container. Empty content
/// is an empty grid regardless of extension.
pub fn parse_tabular(content: &[u8], filename: &str) -> Result<Grid, ParseError> {
    if content.is_empty() {
        return Ok(Grid::empty());
    }
    match file_extension(filename).as_str() {
        "csv" => Ok(csv::parse_csv(&csv::decode_text(content.to_vec()))),
        "xlsx" | "xls" => sheet::parse_sheet(content, filename),
        _ => Err(ParseError::NotTabular {
            filename: filename.to_string(),
        }),
    }
}
