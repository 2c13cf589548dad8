//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                |
//! |---------|-----------|--------------------------------------------|
//! | 0       | Universal | Success                                    |
//! | 1       | Universal | General error (unspecified)                |
//! | 2       | Universal | CLI usage error (bad args, missing flags)  |
//! | 10-19   | auth      | Credential and token problems              |
//! | 20-29   | api       | Backend request failures                   |
//! | 30-39   | local     | Local file read/write problems             |
//! | 40-49   | viewer    | Terminal/viewer failures                   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use custommarket_client::ApiError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Auth (10-19)
// =============================================================================

/// Not signed in, or the server rejected the saved token.
pub const EXIT_AUTH_REQUIRED: u8 = 10;

/// Login/register rejected the supplied credentials.
pub const EXIT_AUTH_INVALID: u8 = 11;

// =============================================================================
// API (20-29)
// =============================================================================

/// Network failure or non-validation HTTP error talking to the backend.
pub const EXIT_API_NETWORK: u8 = 20;

/// The server rejected the request body (400/422 with a detail message).
pub const EXIT_API_VALIDATION: u8 = 21;

/// The server answered with a body this client cannot parse.
pub const EXIT_API_RESPONSE: u8 = 22;

// =============================================================================
// Local files (30-39)
// =============================================================================

/// Cannot read a local input file.
pub const EXIT_FILE_READ: u8 = 30;

/// Cannot write a local output file (download target, CSV export).
pub const EXIT_FILE_WRITE: u8 = 31;

// =============================================================================
// Viewer (40-49)
// =============================================================================

/// Terminal setup or drawing failed (raw mode, alternate screen).
pub const EXIT_VIEWER_TERMINAL: u8 = 40;

// =============================================================================
// Mapping
// =============================================================================

/// Map an API error to its exit code.
pub fn api_exit_code(err: &ApiError) -> u8 {
    match err {
        ApiError::NotAuthenticated => EXIT_AUTH_REQUIRED,
        ApiError::Network(_) => EXIT_API_NETWORK,
        ApiError::Http(_, _) => EXIT_API_NETWORK,
        ApiError::Parse(_) => EXIT_API_RESPONSE,
        ApiError::Io(_) => EXIT_FILE_READ,
        ApiError::Validation(_) => EXIT_API_VALIDATION,
    }
}
