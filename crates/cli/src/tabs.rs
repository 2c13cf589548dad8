//! Tab commands: list, new, rename.
//!
//! The server owns ordering (`sort_order`) and the per-tab file counts;
//! this module only displays them.

use crate::{remote_client, CliError};

pub fn cmd_list(api_url: Option<String>, json: bool, quiet: bool) -> Result<(), CliError> {
    let client = remote_client(api_url)?;

    // Read path: a listing that cannot be fetched shows as empty.
    let tabs = match client.list_tabs() {
        Ok(tabs) => tabs,
        Err(custommarket_client::ApiError::NotAuthenticated) => {
            return Err(CliError::api(custommarket_client::ApiError::NotAuthenticated))
        }
        Err(e) => {
            if !quiet {
                eprintln!("note: could not reach the library ({}); showing nothing", e);
            }
            Vec::new()
        }
    };

    if json {
        let doc = serde_json::to_string_pretty(&tabs)
            .map_err(|e| CliError::other(e.to_string()))?;
        println!("{}", doc);
        return Ok(());
    }

    if tabs.is_empty() {
        if !quiet {
            eprintln!("No tabs");
        }
        return Ok(());
    }

    for tab in &tabs {
        println!("{:>4}  {}  ({} file{})", tab.id, tab.name, tab.file_count, plural(tab.file_count));
    }
    Ok(())
}

pub fn cmd_new(api_url: Option<String>, name: Option<String>, quiet: bool) -> Result<(), CliError> {
    let client = remote_client(api_url)?;
    let tab = client.create_tab(name.as_deref()).map_err(CliError::api)?;
    if !quiet {
        eprintln!("Created tab {} ({})", tab.name, tab.id);
    }
    Ok(())
}

pub fn cmd_rename(
    api_url: Option<String>,
    tab_id: i64,
    name: String,
    quiet: bool,
) -> Result<(), CliError> {
    let client = remote_client(api_url)?;
    let tab = client.rename_tab(tab_id, &name).map_err(CliError::api)?;
    if !quiet {
        eprintln!("Renamed tab {} to {}", tab.id, tab.name);
    }
    Ok(())
}

fn plural(n: u64) -> &'static str {
    if n == 1 { "" } else { "s" }
}
