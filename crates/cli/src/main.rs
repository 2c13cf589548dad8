// CustomMarket CLI - file library, uploads, and row research from the terminal

mod account;
mod exit_codes;
mod files;
mod research;
mod tabs;
mod tui;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use custommarket_client::{resolve_api_base, ApiClient, ApiError};

// Re-export exit codes from registry (single source of truth)
use exit_codes::{
    api_exit_code, EXIT_AUTH_INVALID, EXIT_ERROR, EXIT_FILE_READ, EXIT_FILE_WRITE, EXIT_SUCCESS,
    EXIT_USAGE, EXIT_VIEWER_TERMINAL,
};

#[derive(Parser)]
#[command(name = "cmk")]
#[command(about = "CustomMarket file library and research (terminal client)")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Backend base URL (overrides CUSTOMMARKET_API_URL and the saved login)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Suppress stderr notices
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and save the token
    #[command(after_help = "\
Examples:
  cmk login team@example.com
  cmk login team@example.com --password s3cret
  cmk --api-url http://localhost:8000 login team@example.com")]
    Login {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the saved token
    Logout,

    /// Show the signed-in account
    Whoami {
        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Create an account and sign in
    Register {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// List library files
    #[command(after_help = "\
Examples:
  cmk ls
  cmk ls --tab 3
  cmk ls --json | jq '.[].filename'")]
    Ls {
        /// Only files on this tab
        #[arg(long, value_name = "ID")]
        tab: Option<i64>,

        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Upload files to the library
    #[command(after_help = "\
Examples:
  cmk upload suppliers.csv
  cmk upload q3.xlsx logo.png --tab 2
  cmk upload exports/*.csv")]
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Attach the uploads to this tab
        #[arg(long, value_name = "ID")]
        tab: Option<i64>,
    },

    /// Delete a library file
    Rm {
        /// Server id of the file
        file_id: i64,
    },

    /// Download a file's stored bytes
    Get {
        /// Server id of the file
        file_id: i64,

        /// Output path (defaults to the stored filename)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show or replace a file's notes
    Notes {
        /// Server id of the file
        file_id: i64,

        /// Replace the notes with this text
        #[arg(long, value_name = "TEXT")]
        set: Option<String>,
    },

    /// List and manage tabs
    Tabs {
        #[command(subcommand)]
        command: Option<TabCommands>,

        /// JSON output (listing only)
        #[arg(long)]
        json: bool,
    },

    /// Submit a research request over a file's rows
    #[command(after_help = "\
Row and column indexes are 0-based positions in the file's data rows
(the header row does not count). Omitting both --rows and --cols asks
the server to cover every row.

Examples:
  cmk research 42 --why 'supplier reliability' --what 'risk rating with sources'
  cmk research 42 --rows 0,2,5 --cols 1 --why 'pricing' --what 'market rate'
  cmk research 42 --all --why 'company background' --what 'one-line summary'")]
    Research {
        /// Server id of the file
        file_id: i64,

        /// What the research should look into for each row
        #[arg(long, value_name = "TEXT")]
        why: String,

        /// What a useful result looks like
        #[arg(long, value_name = "TEXT")]
        what: String,

        /// Data-row indexes to cover (comma-separated, 0-based)
        #[arg(long, value_name = "ROWS")]
        rows: Option<String>,

        /// Column indexes to cover (comma-separated, 0-based)
        #[arg(long, value_name = "COLS")]
        cols: Option<String>,

        /// Cover the whole file via the bulk endpoint
        #[arg(long, conflicts_with_all = ["rows", "cols"])]
        all: bool,
    },

    /// Show research outcomes for a file, keyed by row
    Results {
        /// Server id of the file
        file_id: i64,

        /// JSON output
        #[arg(long)]
        json: bool,
    },

    /// Browse a local file interactively (no account needed)
    View {
        /// File to open
        path: PathBuf,
    },

    /// Browse remote files interactively
    #[command(after_help = "\
Examples:
  cmk open             # whole library
  cmk open 42          # one file
  cmk open --tab 3     # one tab")]
    Open {
        /// Open a single file by server id (defaults to the whole library)
        file_id: Option<i64>,

        /// Limit the workbench to one tab
        #[arg(long, value_name = "ID")]
        tab: Option<i64>,
    },
}

#[derive(Subcommand)]
enum TabCommands {
    /// Create a tab
    New {
        /// Tab name (server default when omitted)
        name: Option<String>,
    },

    /// Rename a tab
    Rename {
        /// Server id of the tab
        tab_id: i64,

        /// New name
        name: String,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let api_url = cli.api_url;
    let quiet = cli.quiet;

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: cmk <command> [options]");
            eprintln!("       cmk --help for more information");
            Ok(())
        }
        Some(Commands::Login { email, password }) => {
            account::cmd_login(api_url, email, password, quiet)
        }
        Some(Commands::Logout) => account::cmd_logout(quiet),
        Some(Commands::Whoami { json }) => account::cmd_whoami(api_url, json),
        Some(Commands::Register { email, password, name }) => {
            account::cmd_register(api_url, email, password, name, quiet)
        }
        Some(Commands::Ls { tab, json }) => files::cmd_ls(api_url, tab, json, quiet),
        Some(Commands::Upload { paths, tab }) => files::cmd_upload(api_url, paths, tab, quiet),
        Some(Commands::Rm { file_id }) => files::cmd_rm(api_url, file_id, quiet),
        Some(Commands::Get { file_id, output }) => files::cmd_get(api_url, file_id, output, quiet),
        Some(Commands::Notes { file_id, set }) => files::cmd_notes(api_url, file_id, set, quiet),
        Some(Commands::Tabs { command, json }) => match command {
            None => tabs::cmd_list(api_url, json, quiet),
            Some(TabCommands::New { name }) => tabs::cmd_new(api_url, name, quiet),
            Some(TabCommands::Rename { tab_id, name }) => {
                tabs::cmd_rename(api_url, tab_id, name, quiet)
            }
        },
        Some(Commands::Research { file_id, why, what, rows, cols, all }) => {
            research::cmd_research(api_url, file_id, why, what, rows, cols, all, quiet)
        }
        Some(Commands::Results { file_id, json }) => research::cmd_results(api_url, file_id, json),
        Some(Commands::View { path }) => tui::cmd_view(path, quiet),
        Some(Commands::Open { file_id, tab }) => tui::cmd_open(api_url, file_id, tab, quiet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn file_read(msg: impl Into<String>) -> Self {
        Self { code: EXIT_FILE_READ, message: msg.into(), hint: None }
    }

    pub fn file_write(msg: impl Into<String>) -> Self {
        Self { code: EXIT_FILE_WRITE, message: msg.into(), hint: None }
    }

    pub fn terminal(msg: impl Into<String>) -> Self {
        Self { code: EXIT_VIEWER_TERMINAL, message: msg.into(), hint: None }
    }

    /// Map a login/register rejection. Credential problems get their own
    /// exit code so scripts can tell them from transport failures.
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self { code: EXIT_AUTH_INVALID, message: msg.into(), hint: None }
    }

    /// Create error from an API error with proper exit code.
    pub fn api(err: ApiError) -> Self {
        let code = api_exit_code(&err);
        let hint = match &err {
            ApiError::NotAuthenticated => {
                Some("a token can also come from CUSTOMMARKET_TOKEN".to_string())
            }
            ApiError::Network(_) => Some(
                "is the backend running? the base URL comes from --api-url, \
                 CUSTOMMARKET_API_URL, or the saved login"
                    .to_string(),
            ),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Client for commands that need a signed-in account.
/// `--api-url` beats the environment, which beats the saved login.
pub(crate) fn remote_client(api_url: Option<String>) -> Result<ApiClient, CliError> {
    let mut creds =
        custommarket_client::resolve_auth().ok_or_else(|| CliError::api(ApiError::NotAuthenticated))?;
    if let Some(url) = api_url {
        creds.api_base = url;
    }
    Ok(ApiClient::new(creds))
}

/// Tokenless client for login/register.
pub(crate) fn anonymous_client(api_url: Option<String>) -> ApiClient {
    let base = api_url.unwrap_or_else(resolve_api_base);
    ApiClient::anonymous(&base)
}
