//! Account commands: login, logout, whoami, register.
//!
//! `cmk login <email>`     obtain a token, save it
//! `cmk logout`            forget the saved token
//! `cmk whoami`            show the signed-in account and workspace
//! `cmk register <email>`  create an account, then sign in

use std::io::{self, Write};

use custommarket_client::{delete_auth, save_auth, ApiClient, ApiError, AuthCredentials};

use crate::{anonymous_client, remote_client, CliError};

// ── Login ───────────────────────────────────────────────────────────

pub fn cmd_login(
    api_url: Option<String>,
    email: String,
    password: Option<String>,
    quiet: bool,
) -> Result<(), CliError> {
    let password = resolve_password(password)?;
    let client = anonymous_client(api_url);

    let token = client.login(&email, &password).map_err(credential_error)?;

    let creds = AuthCredentials {
        token: token.access_token,
        api_base: client.api_base().to_string(),
        email: Some(email.clone()),
    };
    save_auth(&creds).map_err(CliError::other)?;

    // Token already proved itself; `me` only decorates the confirmation.
    let signed_in = ApiClient::new(creds);
    if !quiet {
        match signed_in.me() {
            Ok(user) => {
                eprintln!("Signed in as {} (workspace: {})", user.email, user.workspace_name)
            }
            Err(_) => eprintln!("Signed in as {}", email),
        }
    }
    Ok(())
}

// ── Logout ──────────────────────────────────────────────────────────

pub fn cmd_logout(quiet: bool) -> Result<(), CliError> {
    delete_auth().map_err(CliError::other)?;
    if !quiet {
        eprintln!("Signed out");
    }
    Ok(())
}

// ── Whoami ──────────────────────────────────────────────────────────

pub fn cmd_whoami(api_url: Option<String>, json: bool) -> Result<(), CliError> {
    let client = remote_client(api_url)?;
    let user = client.me().map_err(CliError::api)?;

    if json {
        let doc = serde_json::to_string_pretty(&user)
            .map_err(|e| CliError::other(e.to_string()))?;
        println!("{}", doc);
        return Ok(());
    }

    println!("{}", user.email);
    if let Some(name) = &user.name {
        println!("name:       {}", name);
    }
    println!("workspace:  {} ({})", user.workspace_name, user.workspace_id);
    println!("api:        {}", client.api_base());
    Ok(())
}

// ── Register ────────────────────────────────────────────────────────

pub fn cmd_register(
    api_url: Option<String>,
    email: String,
    password: Option<String>,
    name: Option<String>,
    quiet: bool,
) -> Result<(), CliError> {
    let password = resolve_password(password)?;
    let client = anonymous_client(api_url);

    let user = client
        .register(&email, &password, name.as_deref())
        .map_err(credential_error)?;

    // Registration does not hand back a token; sign in with the same
    // credentials to get one.
    let token = client.login(&email, &password).map_err(credential_error)?;
    let creds = AuthCredentials {
        token: token.access_token,
        api_base: client.api_base().to_string(),
        email: Some(user.email.clone()),
    };
    save_auth(&creds).map_err(CliError::other)?;

    if !quiet {
        eprintln!("Registered {} (workspace: {})", user.email, user.workspace_name);
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Resolve the password: --password flag > interactive prompt.
fn resolve_password(password: Option<String>) -> Result<String, CliError> {
    if let Some(p) = password {
        return Ok(p);
    }
    if !atty::is(atty::Stream::Stdin) {
        return Err(CliError::args("No password provided and stdin is not a TTY")
            .with_hint("pass --password"));
    }

    eprint!("Password: ");
    io::stderr().flush().ok();
    let mut buf = String::new();
    io::stdin()
        .read_line(&mut buf)
        .map_err(|e| CliError::other(e.to_string()))?;
    let trimmed = buf.trim().to_string();
    if trimmed.is_empty() {
        return Err(CliError::args("No password provided")
            .with_hint("pass --password or type one at the prompt"));
    }
    Ok(trimmed)
}

/// Login/register rejections get the credential exit code; everything
/// else keeps the generic API mapping.
fn credential_error(e: ApiError) -> CliError {
    match e {
        ApiError::Validation(msg) => CliError::credentials(msg),
        // The shared response checker folds 401 into NotAuthenticated;
        // during login that means the credentials themselves were bad.
        ApiError::NotAuthenticated => CliError::credentials("Invalid email or password"),
        ApiError::Http(403, _) => CliError::credentials("Invalid email or password"),
        other => CliError::api(other),
    }
}
