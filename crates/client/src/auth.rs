//! Token storage and resolution.
//!
//! Reads/writes ~/.config/custommarket/auth.json (0600 on Unix).
//! Environment variables override the file: `CUSTOMMARKET_TOKEN` supplies
//! a bearer token directly (CI use), `CUSTOMMARKET_API_URL` repoints the
//! backend without touching saved credentials.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Backend URL used when nothing is saved and no override is set.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Authentication credentials stored locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// Bearer token for the CustomMarket API
    pub token: String,
    /// API base URL (e.g., "http://localhost:8000")
    pub api_base: String,
    /// Signed-in email (for display)
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthCredentials {
    pub fn new(token: String, api_base: String) -> Self {
        Self { token, api_base, email: None }
    }
}

/// Returns the path to the auth credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("custommarket/auth.json"))
}

/// Load saved auth credentials from disk.
/// Returns None if no credentials are saved or if the file is invalid.
pub fn load_auth() -> Option<AuthCredentials> {
    let path = auth_file_path()?;
    let contents = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Resolve credentials for a request: environment first, saved file second.
/// Returns None when neither source yields a token.
pub fn resolve_auth() -> Option<AuthCredentials> {
    let env_token = std::env::var("CUSTOMMARKET_TOKEN").ok().filter(|t| !t.is_empty());
    let env_url = std::env::var("CUSTOMMARKET_API_URL").ok().filter(|u| !u.is_empty());
    let saved = load_auth();

    let token = env_token.or_else(|| saved.as_ref().map(|c| c.token.clone()))?;
    let api_base = env_url
        .or_else(|| saved.as_ref().map(|c| c.api_base.clone()))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let email = saved.and_then(|c| c.email);

    Some(AuthCredentials { token, api_base, email })
}

/// Resolve the API base URL for unauthenticated calls (login, register).
pub fn resolve_api_base() -> String {
    std::env::var("CUSTOMMARKET_API_URL")
        .ok()
        .filter(|u| !u.is_empty())
        .or_else(|| load_auth().map(|c| c.api_base))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Save auth credentials to disk.
/// Creates the parent directory if it doesn't exist.
/// Sets 0600 permissions on Unix.
pub fn save_auth(creds: &AuthCredentials) -> Result<(), String> {
    let path = auth_file_path().ok_or("Could not determine config directory")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| format!("Failed to serialize credentials: {}", e))?;

    std::fs::write(&path, &contents)
        .map_err(|e| format!("Failed to write auth file: {}", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, permissions)
            .map_err(|e| format!("Failed to set file permissions: {}", e))?;
    }

    Ok(())
}

/// Delete saved auth credentials.
pub fn delete_auth() -> Result<(), String> {
    let Some(path) = auth_file_path() else {
        return Ok(());
    };
    if path.exists() {
        std::fs::remove_file(&path)
            .map_err(|e| format!("Failed to delete auth file: {}", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_credentials_roundtrip() {
        let creds = AuthCredentials {
            token: "test-token".into(),
            api_base: "http://localhost:8000".into(),
            email: Some("alice@example.com".into()),
        };

        let json = serde_json::to_string_pretty(&creds).unwrap();
        let parsed: AuthCredentials = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.token, "test-token");
        assert_eq!(parsed.api_base, "http://localhost:8000");
        assert_eq!(parsed.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_auth_credentials_missing_optional_fields() {
        let json = r#"{"token":"tok","api_base":"http://localhost:8000"}"#;
        let parsed: AuthCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.token, "tok");
        assert!(parsed.email.is_none());
    }

    #[test]
    fn test_auth_file_path_exists() {
        let path = auth_file_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("custommarket"));
        assert!(path.to_string_lossy().contains("auth.json"));
    }

    #[test]
    fn test_save_and_load_auth() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");

        // Manually write and read since save_auth uses the real config path
        let creds = AuthCredentials::new("tok123".into(), "http://api.test".into());
        let json = serde_json::to_string_pretty(&creds).unwrap();
        std::fs::write(&path, &json).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: AuthCredentials = serde_json::from_str(&contents).unwrap();
        assert_eq!(loaded.token, "tok123");
        assert_eq!(loaded.api_base, "http://api.test");
    }
}
