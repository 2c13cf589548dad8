//! File commands: ls, upload, rm, get, notes.
//!
//! Listing is a read path and degrades on transport failure (empty list
//! plus a stderr notice). Everything that writes to the server surfaces
//! its failure.

use std::path::PathBuf;

use custommarket_client::{ApiClient, ApiError, UploadPart};
use custommarket_core::Grid;
use custommarket_io::{classify, parse_tabular, FileKind};
use custommarket_library::{FileRecord, UploadState, Workbench};

use crate::util::{clip, display_width, format_size, pad_cell};
use crate::{remote_client, CliError};

// ── ls ──────────────────────────────────────────────────────────────

pub fn cmd_ls(
    api_url: Option<String>,
    tab: Option<i64>,
    json: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let client = remote_client(api_url)?;
    let records = list_or_empty(&client, tab, quiet)?;

    if json {
        let doc = serde_json::to_string_pretty(&records)
            .map_err(|e| CliError::other(e.to_string()))?;
        println!("{}", doc);
        return Ok(());
    }

    if records.is_empty() {
        if !quiet {
            eprintln!("No files");
        }
        return Ok(());
    }

    // Column widths track content, clamped so one long filename does not
    // blow up the table.
    let mut id_w = 2;
    let mut name_w = "FILENAME".len();
    for r in &records {
        id_w = id_w.max(r.id.to_string().len());
        name_w = name_w.max(display_width(&r.filename));
    }
    let name_w = name_w.min(40);

    println!(
        "{}  {}  {:<11}  {:>9}  {:>6}  {:>4}",
        pad_cell("ID", id_w),
        pad_cell("FILENAME", name_w),
        "KIND",
        "SIZE",
        "ROWS",
        "TAB"
    );
    for r in &records {
        let kind = classify(&r.filename, r.mime_type.as_deref());
        let rows = match (&r.parsed_data, kind) {
            (Some(rows), FileKind::Tabular) => rows.len().saturating_sub(1).to_string(),
            _ => "-".to_string(),
        };
        let size = r.size.map(|s| format_size(s as i64)).unwrap_or_else(|| "-".to_string());
        let tab = r.tab_id.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {:<11}  {:>9}  {:>6}  {:>4}",
            pad_cell(&r.id.to_string(), id_w),
            pad_cell(&clip(&r.filename, name_w), name_w),
            kind.as_str(),
            size,
            rows,
            tab
        );
    }
    Ok(())
}

/// Fetch the listing, degrading transport failures to an empty list.
/// A rejected token still surfaces; there is no useful degraded answer
/// to "who am I".
pub(crate) fn list_or_empty(
    client: &ApiClient,
    tab: Option<i64>,
    quiet: bool,
) -> Result<Vec<custommarket_protocol::FileRecord>, CliError> {
    match client.list_files(tab) {
        Ok(records) => Ok(records),
        Err(ApiError::NotAuthenticated) => Err(CliError::api(ApiError::NotAuthenticated)),
        Err(e) => {
            if !quiet {
                eprintln!("note: could not reach the library ({}); showing nothing", e);
            }
            Ok(Vec::new())
        }
    }
}

/// Look one record up by server id. Single-record lookups do not
/// degrade; a missing id is an answer, not an outage.
pub(crate) fn find_record(
    client: &ApiClient,
    id: i64,
) -> Result<custommarket_protocol::FileRecord, CliError> {
    let records = client.list_files(None).map_err(CliError::api)?;
    records
        .into_iter()
        .find(|r| r.id == id)
        .ok_or_else(|| {
            CliError::other(format!("No file with id {}", id)).with_hint("`cmk ls` shows ids")
        })
}

// ── upload ──────────────────────────────────────────────────────────

pub fn cmd_upload(
    api_url: Option<String>,
    paths: Vec<PathBuf>,
    tab: Option<i64>,
    quiet: bool,
) -> Result<(), CliError> {
    let client = remote_client(api_url)?;

    // Stage everything locally first so one unreadable path fails the
    // command before any bytes go out.
    let mut workbench = Workbench::new();
    let mut parts = Vec::with_capacity(paths.len());
    for path in &paths {
        let part = UploadPart::from_path(path)
            .map_err(|e| CliError::file_read(format!("{}: {}", path.display(), e)))?;
        let size = part.bytes.len() as u64;

        let kind = classify(&part.filename, None);
        let grid = if kind == FileKind::Tabular {
            match parse_tabular(&part.bytes, &part.filename) {
                Ok(grid) => grid,
                Err(e) => {
                    // Unparseable tabular content still uploads; it just
                    // has no local grid.
                    if !quiet {
                        eprintln!("note: {}: {}", part.filename, e);
                    }
                    Grid::empty()
                }
            }
        } else {
            Grid::empty()
        };

        workbench.add(FileRecord::pending(part.filename.clone(), None, size, grid, tab));
        parts.push(part);
    }

    let pending = workbench.begin_upload();
    if pending.is_empty() {
        return Err(CliError::args("nothing to upload"));
    }

    match client.upload_files(parts, tab) {
        Ok(resp) => {
            let outcome = workbench.reconcile_upload(resp.uploaded);
            report_upload(&workbench, quiet);
            if outcome.appended > 0 && !quiet {
                eprintln!("note: server reported {} record(s) we did not send", outcome.appended);
            }
            if outcome.failed > 0 {
                return Err(CliError::other(format!(
                    "server persisted {} of {} file(s)",
                    outcome.persisted,
                    outcome.persisted + outcome.failed
                )));
            }
            Ok(())
        }
        Err(e) => {
            workbench.fail_upload(&e.to_string());
            report_upload(&workbench, quiet);
            Err(CliError::api(e))
        }
    }
}

fn report_upload(workbench: &Workbench, quiet: bool) {
    if quiet {
        return;
    }
    for record in workbench.records() {
        match &record.state {
            UploadState::Persisted => {
                let id = record
                    .remote_id
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "?".to_string());
                eprintln!("uploaded {} (id {})", record.filename, id);
            }
            UploadState::Failed { reason } => {
                eprintln!("failed   {}: {}", record.filename, reason);
            }
            state => eprintln!("{:<9}{}", state.to_string(), record.filename),
        }
    }
}

// ── rm ──────────────────────────────────────────────────────────────

pub fn cmd_rm(api_url: Option<String>, file_id: i64, quiet: bool) -> Result<(), CliError> {
    let client = remote_client(api_url)?;
    client.delete_file(file_id).map_err(CliError::api)?;
    if !quiet {
        eprintln!("Deleted {}", file_id);
    }
    Ok(())
}

// ── get ─────────────────────────────────────────────────────────────

pub fn cmd_get(
    api_url: Option<String>,
    file_id: i64,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let client = remote_client(api_url)?;

    // Default the output name to whatever the server has on record.
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(find_record(&client, file_id)?.filename),
    };

    let bytes = client.download_file(file_id).map_err(CliError::api)?;
    std::fs::write(&output, &bytes)
        .map_err(|e| CliError::file_write(format!("{}: {}", output.display(), e)))?;
    if !quiet {
        eprintln!("Wrote {} ({})", output.display(), format_size(bytes.len() as i64));
    }
    Ok(())
}

// ── notes ───────────────────────────────────────────────────────────

pub fn cmd_notes(
    api_url: Option<String>,
    file_id: i64,
    set: Option<String>,
    quiet: bool,
) -> Result<(), CliError> {
    let client = remote_client(api_url)?;

    match set {
        Some(text) => {
            let updated = client.update_notes(file_id, &text).map_err(CliError::api)?;
            if !quiet {
                eprintln!("Notes updated for {}", updated.filename);
            }
        }
        None => {
            // Raw to stdout so notes pipe cleanly.
            let record = find_record(&client, file_id)?;
            if !record.notes.is_empty() {
                println!("{}", record.notes);
            }
        }
    }
    Ok(())
}
