//! CSV ingest and export.
//!
//! Ingest reproduces the dashboard's historical scanner, not RFC 4180:
//! - lines split on `\n` / `\r\n`; lines blank after trim are dropped
//! - a double quote toggles "in quotes" and is dropped from the output
//! - a comma splits outside quotes; a tab splits unconditionally
//! - there is no escaped-quote pairing: `""` toggles twice and emits
//!   nothing, so a literal quote cannot be represented
//! - every cell is trimmed
//!
//! Export goes through the `csv` writer and is standards-shaped; the
//! asymmetry is deliberate (exports feed other tools, ingest feeds the
//! table view).

use std::path::Path;

use custommarket_core::Grid;

/// Decode raw bytes as UTF-8, falling back to Windows-1252 (common for
/// Excel-exported CSVs).
pub fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

/// Parse CSV text into a grid. Never fails; empty text is an empty grid.
pub fn parse_csv(text: &str) -> Grid {
    let rows: Vec<Vec<String>> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect();
    Grid::new(rows)
}

fn parse_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if (c == ',' && !in_quotes) || c == '\t' {
            cells.push(cur.trim().to_string());
            cur.clear();
        } else {
            cur.push(c);
        }
    }
    cells.push(cur.trim().to_string());
    cells
}

/// Write rows (header first) to `path` as comma-separated CSV.
/// Rows may be variable width; the writer is flexible on purpose.
pub fn export_csv(path: &Path, rows: &[Vec<String>]) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    for row in rows {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}
