//! Research commands: submit requests and show per-row outcomes.
//!
//! Row/column indexes on the wire are 0-based positions into the file's
//! data rows; an empty selection asks the server to cover everything.

use custommarket_protocol::{ResearchAllRequest, ResearchRequest};

use crate::files::find_record;
use crate::{remote_client, CliError};

pub fn cmd_research(
    api_url: Option<String>,
    file_id: i64,
    why: String,
    what: String,
    rows: Option<String>,
    cols: Option<String>,
    all: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let client = remote_client(api_url)?;

    let accepted = if all {
        // The bulk endpoint wants the file's dimensions up front.
        let record = find_record(&client, file_id)?;
        let Some(data) = record.parsed_data else {
            return Err(CliError::args(format!(
                "{} has no tabular data to research",
                record.filename
            )));
        };
        let total_rows = data.len().saturating_sub(1);
        let total_columns = data.first().map(|r| r.len()).unwrap_or(0);
        let req = ResearchAllRequest {
            file_id,
            total_rows,
            total_columns,
            why_fields: why,
            what_result: what,
        };
        client.submit_research_all(&req).map_err(CliError::api)?
    } else {
        let selected_rows = rows.as_deref().map(parse_index_list).transpose()?.unwrap_or_default();
        let selected_columns =
            cols.as_deref().map(parse_index_list).transpose()?.unwrap_or_default();
        let req = ResearchRequest {
            file_id,
            selected_rows,
            selected_columns,
            why_fields: why,
            what_result: what,
        };
        client.submit_research(&req).map_err(CliError::api)?
    };

    if !quiet {
        eprintln!(
            "Accepted request {} (analyze {}, {} row(s) queued)",
            accepted.id, accepted.analyze_id, accepted.searchable_count
        );
    }
    Ok(())
}

pub fn cmd_results(api_url: Option<String>, file_id: i64, json: bool) -> Result<(), CliError> {
    let client = remote_client(api_url)?;
    let results = client.search_results(file_id).map_err(CliError::api)?;

    if json {
        let doc = serde_json::to_string_pretty(&results)
            .map_err(|e| CliError::other(e.to_string()))?;
        println!("{}", doc);
        return Ok(());
    }

    if results.by_row.is_empty() {
        eprintln!("No research results for file {}", file_id);
        return Ok(());
    }

    for (row, research) in &results.by_row {
        println!(
            "row {}  ({} result{})  query: {}",
            row,
            research.results_count,
            if research.results_count == 1 { "" } else { "s" },
            research.query_used
        );
        for value in &research.results {
            // One compact JSON document per line; shapes vary by source.
            match serde_json::to_string(value) {
                Ok(line) => println!("  {}", line),
                Err(_) => println!("  {}", value),
            }
        }
    }
    Ok(())
}

/// Parse "0,2,5" into sorted, deduplicated indexes.
fn parse_index_list(arg: &str) -> Result<Vec<usize>, CliError> {
    let mut out = Vec::new();
    for piece in arg.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let idx = piece.parse::<usize>().map_err(|_| {
            CliError::args(format!("invalid index \"{}\"", piece))
                .with_hint("indexes are 0-based numbers, comma-separated: 0,2,5")
        })?;
        out.push(idx);
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_list_basic() {
        assert_eq!(parse_index_list("0,2,5").unwrap(), vec![0, 2, 5]);
    }

    #[test]
    fn index_list_sorts_and_dedups() {
        assert_eq!(parse_index_list("5,0,5,2").unwrap(), vec![0, 2, 5]);
    }

    #[test]
    fn index_list_tolerates_spacing_and_trailing_comma() {
        assert_eq!(parse_index_list(" 1 , 3 ,").unwrap(), vec![1, 3]);
    }

    #[test]
    fn index_list_rejects_words() {
        let err = parse_index_list("1,two").unwrap_err();
        assert!(err.message.contains("two"));
    }

    #[test]
    fn index_list_rejects_negatives() {
        assert!(parse_index_list("-1").is_err());
    }

    #[test]
    fn index_list_empty_means_all() {
        assert_eq!(parse_index_list("").unwrap(), Vec::<usize>::new());
    }
}
