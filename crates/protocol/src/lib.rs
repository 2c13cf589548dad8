//! CustomMarket Backend Wire Types
//!
//! This crate defines the canonical request and response bodies for the
//! CustomMarket REST API. Everything is plain JSON over HTTP; there is no
//! envelope and no versioning header; the field sets below ARE the contract.
//!
//! Conventions:
//! - Server-assigned ids are `i64` (the backend hands out plain integers).
//! - Fields the server may omit or null are `Option` and tolerate absence
//!   on deserialization via `#[serde(default)]`.
//! - Request bodies never serialize `None` fields.
//!
//! # Usage
//!
//! ```ignore
//! use custommarket_protocol::{LoginRequest, TokenResponse};
//!
//! let body = serde_json::to_string(&LoginRequest {
//!     email: "a@b.c".into(),
//!     password: "secret".into(),
//! })?;
//! let token: TokenResponse = serde_json::from_str(&response_body)?;
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Auth
// =============================================================================

/// Body for `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response from `POST /api/auth/login`. The token is a bearer token;
/// the server does not report an expiry, so clients keep it until a
/// request comes back 401.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Response from `GET /api/auth/me` and `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub workspace_name: String,
}

// =============================================================================
// Files
// =============================================================================

/// A stored file as the server reports it.
///
/// `parsed_data` is the full grid (header row first) for tabular files and
/// absent for images. `storage_path` is a server-side detail that is often
/// empty; it is carried so round-trips do not drop it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    #[serde(default)]
    pub document_id: String,
    pub filename: String,
    #[serde(default)]
    pub storage_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub notes: String,
}

/// Response from `POST /api/files/upload` (multipart). The server answers
/// with the records it persisted, in the order it persisted them, which
/// is not guaranteed to match the submission order or count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub uploaded: Vec<FileRecord>,
}

/// Body for `PATCH /api/files/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesUpdate {
    pub notes: String,
}

/// Body for `PATCH /api/files/{id}/data`. Sends the whole grid;
/// the server does not do cell-level patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDataUpdate {
    pub parsed_data: Vec<Vec<String>>,
}

/// Generic acknowledgement, e.g. from `DELETE /api/files/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acknowledged {
    #[serde(default)]
    pub ok: bool,
}

// =============================================================================
// Tabs
// =============================================================================

/// A workspace tab as the server reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub file_count: u64,
}

/// Body for `POST /api/tabs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabCreate {
    pub name: String,
}

impl Default for TabCreate {
    fn default() -> Self {
        TabCreate { name: "New Tab".to_string() }
    }
}

/// Body for `PATCH /api/tabs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabRename {
    pub name: String,
}

// =============================================================================
// Research
// =============================================================================

/// Body for `POST /api/research-requests`.
///
/// Row and column indices are positions in the file's original grid
/// (0-based data rows, header row excluded), independent of any filter
/// or page the user was looking at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub file_id: i64,
    pub selected_rows: Vec<usize>,
    pub selected_columns: Vec<usize>,
    pub why_fields: String,
    pub what_result: String,
}

/// Body for `POST /api/research-all-requests`. Covers the whole grid, so
/// it carries extents instead of index lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchAllRequest {
    pub file_id: i64,
    pub total_rows: usize,
    pub total_columns: usize,
    pub why_fields: String,
    pub what_result: String,
}

/// Response from both research submission endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchAccepted {
    pub id: i64,
    #[serde(default)]
    pub analyze_id: i64,
    #[serde(default)]
    pub searchable_count: u64,
    #[serde(default)]
    pub ok: bool,
}

/// Per-row research outcome inside [`SearchResults`].
///
/// `results` is passed through untyped: the result objects vary by
/// search provider and the client only renders them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowResearch {
    #[serde(default)]
    pub results_count: u64,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub query_text: String,
    #[serde(default)]
    pub query_used: String,
}

/// Response from `GET /api/files/{id}/search-results`.
///
/// Keyed by original row index. JSON object keys arrive as strings
/// ("3": {...}); serde handles the integer conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub by_row: BTreeMap<usize, RowResearch>,
}

// =============================================================================
// Errors
// =============================================================================

/// Error body the server attaches to non-2xx responses. FastAPI-style:
/// a single `detail` string. Anything else (HTML error pages, empty
/// bodies) fails to parse and clients fall back to the status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub detail: String,
}
