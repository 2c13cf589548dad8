//! Backend API client, shared by the CLI and the TUI.
//!
//! This crate is the single place that talks HTTP to the CustomMarket
//! backend: auth, file upload/download, tabs, notes, grid saves, research
//! submissions. Bodies are the types from `custommarket-protocol`.
//!
//! No UI concepts. No retries. One timeout per request so a dead server
//! cannot hang a caller forever.

mod auth;
mod client;

pub use auth::{
    auth_file_path, delete_auth, load_auth, resolve_api_base, resolve_auth, save_auth,
    AuthCredentials, DEFAULT_API_URL,
};
pub use client::{ApiClient, ApiError, UploadPart};
