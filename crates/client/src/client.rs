//! CustomMarket HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).
//! Covers the full surface the CLI needs: auth, file listing, multipart
//! upload, downloads, notes and grid saves, tabs, research submissions.

use std::time::Duration;

use custommarket_protocol::{
    Acknowledged, ApiErrorBody, FileRecord, LoginRequest, NotesUpdate, ParsedDataUpdate,
    RegisterRequest, ResearchAccepted, ResearchAllRequest, ResearchRequest, SearchResults, Tab,
    TabCreate, TabRename, TokenResponse, UploadResponse, UserInfo,
};

use crate::auth::{resolve_auth, AuthCredentials};

/// CustomMarket API client (blocking).
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: Option<String>,
}

/// Error type for backend operations.
#[derive(Debug)]
pub enum ApiError {
    /// No auth credentials configured, or the server rejected the token
    NotAuthenticated,
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
    /// JSON parsing error
    Parse(String),
    /// Local file I/O error
    Io(String),
    /// Server rejected the request body (4xx with a detail message)
    Validation(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::NotAuthenticated => write!(f, "Not signed in — run `cmk login` first"),
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Io(msg) => write!(f, "I/O error: {}", msg),
            ApiError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// One file in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl UploadPart {
    /// Read a local file into an upload part. The MIME type is left for
    /// the caller; the server classifies by extension when it is absent.
    pub fn from_path(path: &std::path::Path) -> Result<Self, ApiError> {
        let bytes = std::fs::read(path).map_err(|e| ApiError::Io(e.to_string()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self { filename, bytes, mime_type: None })
    }
}

impl ApiClient {
    /// Create a client from saved credentials (file or environment).
    pub fn from_saved_auth() -> Result<Self, ApiError> {
        let creds = resolve_auth().ok_or(ApiError::NotAuthenticated)?;
        Ok(Self::new(creds))
    }

    /// Create a client with explicit credentials.
    pub fn new(creds: AuthCredentials) -> Self {
        Self::build(creds.api_base, Some(creds.token))
    }

    /// Create a tokenless client for login/register.
    pub fn anonymous(api_base: &str) -> Self {
        Self::build(api_base.to_string(), None)
    }

    fn build(api_base: String, token: Option<String>) -> Self {
        // A hanging backend must not hang the caller; 30s covers the
        // largest uploads we see in practice.
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("cmk/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, api_base, token }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    // ── Auth ────────────────────────────────────────────────────────

    /// Exchange email/password for a bearer token.
    pub fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let url = format!("{}/api/auth/login", self.api_base);
        let body = LoginRequest { email: email.to_string(), password: password.to_string() };
        let resp = self.post_json(&url, &body)?;
        resp.json::<TokenResponse>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Create an account. The server signs the new user in implicitly;
    /// follow up with [`ApiClient::login`] to obtain a token.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<UserInfo, ApiError> {
        let url = format!("{}/api/auth/register", self.api_base);
        let body = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: name.map(String::from),
        };
        let resp = self.post_json(&url, &body)?;
        resp.json::<UserInfo>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Verify the current token and get user info.
    pub fn me(&self) -> Result<UserInfo, ApiError> {
        let url = format!("{}/api/auth/me", self.api_base);
        let resp = self.get(&url)?;
        resp.json::<UserInfo>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    // ── Files ───────────────────────────────────────────────────────

    /// List stored files, optionally restricted to one tab.
    pub fn list_files(&self, tab_id: Option<i64>) -> Result<Vec<FileRecord>, ApiError> {
        let url = match tab_id {
            Some(id) => format!("{}/api/files?tab_id={}", self.api_base, id),
            None => format!("{}/api/files", self.api_base),
        };
        let resp = self.get(&url)?;
        resp.json::<Vec<FileRecord>>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Upload one or more files in a single multipart request.
    ///
    /// The response lists the records the server persisted, in server
    /// order; callers reconcile it against their pending entries.
    pub fn upload_files(
        &self,
        parts: Vec<UploadPart>,
        tab_id: Option<i64>,
    ) -> Result<UploadResponse, ApiError> {
        let url = format!("{}/api/files/upload", self.api_base);

        let mut form = reqwest::blocking::multipart::Form::new();
        for part in parts {
            let mut piece = reqwest::blocking::multipart::Part::bytes(part.bytes)
                .file_name(part.filename);
            if let Some(mime) = part.mime_type {
                piece = piece
                    .mime_str(&mime)
                    .map_err(|e| ApiError::Validation(format!("Invalid MIME type: {}", e)))?;
            }
            form = form.part("files", piece);
        }
        if let Some(id) = tab_id {
            form = form.text("tab_id", id.to_string());
        }

        let response = self
            .authed(self.http.post(&url))
            .multipart(form)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let resp = Self::check(response)?;
        resp.json::<UploadResponse>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Download the original stored bytes of a file.
    pub fn download_file(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/api/files/{}/content", self.api_base, id);
        let resp = self.get(&url)?;
        let bytes = resp.bytes().map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Replace a file's notes.
    pub fn update_notes(&self, id: i64, notes: &str) -> Result<FileRecord, ApiError> {
        let url = format!("{}/api/files/{}", self.api_base, id);
        let resp = self.patch_json(&url, &NotesUpdate { notes: notes.to_string() })?;
        resp.json::<FileRecord>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Replace a file's parsed grid (whole-grid save, no cell patches).
    pub fn update_parsed_data(
        &self,
        id: i64,
        parsed_data: Vec<Vec<String>>,
    ) -> Result<FileRecord, ApiError> {
        let url = format!("{}/api/files/{}/data", self.api_base, id);
        let resp = self.patch_json(&url, &ParsedDataUpdate { parsed_data })?;
        resp.json::<FileRecord>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Fetch per-row research results for a file.
    pub fn search_results(&self, id: i64) -> Result<SearchResults, ApiError> {
        let url = format!("{}/api/files/{}/search-results", self.api_base, id);
        let resp = self.get(&url)?;
        resp.json::<SearchResults>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Delete a stored file.
    pub fn delete_file(&self, id: i64) -> Result<(), ApiError> {
        let url = format!("{}/api/files/{}", self.api_base, id);
        let resp = self.delete(&url)?;
        resp.json::<Acknowledged>().map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(())
    }

    // ── Tabs ────────────────────────────────────────────────────────

    /// List tabs in sort order.
    pub fn list_tabs(&self) -> Result<Vec<Tab>, ApiError> {
        let url = format!("{}/api/tabs", self.api_base);
        let resp = self.get(&url)?;
        resp.json::<Vec<Tab>>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Create a tab. `None` gets the server-side placeholder name.
    pub fn create_tab(&self, name: Option<&str>) -> Result<Tab, ApiError> {
        let url = format!("{}/api/tabs", self.api_base);
        let body = match name {
            Some(n) => TabCreate { name: n.to_string() },
            None => TabCreate::default(),
        };
        let resp = self.post_json(&url, &body)?;
        resp.json::<Tab>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Rename a tab.
    pub fn rename_tab(&self, id: i64, name: &str) -> Result<Tab, ApiError> {
        let url = format!("{}/api/tabs/{}", self.api_base, id);
        let resp = self.patch_json(&url, &TabRename { name: name.to_string() })?;
        resp.json::<Tab>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    // ── Research ────────────────────────────────────────────────────

    /// Submit a research request for selected rows/columns of a file.
    pub fn submit_research(&self, req: &ResearchRequest) -> Result<ResearchAccepted, ApiError> {
        let url = format!("{}/api/research-requests", self.api_base);
        let resp = self.post_json(&url, req)?;
        resp.json::<ResearchAccepted>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Submit a research request covering a whole file.
    pub fn submit_research_all(
        &self,
        req: &ResearchAllRequest,
    ) -> Result<ResearchAccepted, ApiError> {
        let url = format!("{}/api/research-all-requests", self.api_base);
        let resp = self.post_json(&url, req)?;
        resp.json::<ResearchAccepted>().map_err(|e| ApiError::Parse(e.to_string()))
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn authed(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .authed(self.http.get(url))
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check(response)
    }

    fn post_json<B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .authed(self.http.post(url))
            .json(body)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check(response)
    }

    fn patch_json<B: serde::Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .authed(self.http.patch(url))
            .json(body)
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check(response)
    }

    fn delete(&self, url: &str) -> Result<reqwest::blocking::Response, ApiError> {
        let response = self
            .authed(self.http.delete(url))
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::check(response)
    }

    fn check(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ApiError> {
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }
        if status == 401 {
            return Err(ApiError::NotAuthenticated);
        }
        let body = response.text().unwrap_or_default();
        let detail = error_detail(status, &body);
        if status == 400 || status == 422 {
            return Err(ApiError::Validation(detail));
        }
        Err(ApiError::Http(status, detail))
    }
}

/// Extract the server's `detail` message from an error body, falling back
/// to a generic message when the body is not the expected JSON shape.
fn error_detail(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.detail.is_empty() => parsed.detail,
        _ => format!("Request failed with status {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_server_message() {
        let detail = error_detail(404, r#"{"detail": "File not found"}"#);
        assert_eq!(detail, "File not found");
    }

    #[test]
    fn test_error_detail_falls_back_on_junk() {
        assert_eq!(error_detail(502, "<html>Bad Gateway</html>"), "Request failed with status 502");
        assert_eq!(error_detail(500, ""), "Request failed with status 500");
        assert_eq!(error_detail(500, r#"{"detail": ""}"#), "Request failed with status 500");
    }

    #[test]
    fn test_upload_part_from_missing_path() {
        let err = UploadPart::from_path(std::path::Path::new("/no/such/file.csv"));
        assert!(matches!(err, Err(ApiError::Io(_))));
    }

    #[test]
    fn test_display_messages() {
        let e = ApiError::Http(503, "Service Unavailable".into());
        assert_eq!(e.to_string(), "HTTP 503: Service Unavailable");
        assert!(ApiError::NotAuthenticated.to_string().contains("cmk login"));
    }
}
