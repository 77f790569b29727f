//! Credential resolution for authenticated portal downloads.
//!
//! The portal requires a `username`/`token` pair on download URLs. CLI
//! flags take priority; otherwise credentials are read from the server's
//! own configuration files, checked in order:
//!
//! 1. `server-settings.json` - `username` / `token`
//! 2. `player-data.json` - `service-username` / `service-token`
//!
//! Default candidate locations are inferred relative to the parent of the
//! mods directory (`data/server-settings.json`, `server-settings.json`,
//! `player-data.json`). A candidate that exists but fails to parse is a
//! warning and the next source is tried; ending up with no usable pair is
//! a fatal configuration error.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::FactupError;

/// The `username`/`token` pair sent on download requests.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// factorio.com account name
    pub username: String,
    /// factorio.com service token (not the account password)
    pub token: String,
}

/// Where to look for credentials, before defaults are inferred.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Explicit username (CLI flag), highest priority
    pub username: Option<String>,
    /// Explicit token (CLI flag), highest priority
    pub token: Option<String>,
    /// Explicit path to server-settings.json
    pub settings_path: Option<PathBuf>,
    /// Explicit path to player-data.json
    pub data_path: Option<PathBuf>,
}

/// Superset of the fields factup reads from either credential file.
#[derive(Debug, Default, Deserialize)]
struct AuthFile {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "service-username")]
    service_username: Option<String>,
    #[serde(default, rename = "service-token")]
    service_token: Option<String>,
}

fn load_auth_file(path: &Path) -> Option<AuthFile> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "credential file not readable");
            return None;
        }
    };
    match serde_json::from_slice(&data) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse credential file");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Resolve portal credentials for the installation owning `mod_dir`.
///
/// Returns [`FactupError::Config`] when no complete pair can be assembled
/// from the flags and candidate files.
pub fn resolve_credentials(mod_dir: &Path, sources: CredentialSources) -> Result<Credentials> {
    let base_dir = mod_dir.parent().unwrap_or(mod_dir);

    let settings_path = sources.settings_path.or_else(|| {
        [
            base_dir.join("data").join("server-settings.json"),
            base_dir.join("server-settings.json"),
        ]
        .into_iter()
        .find(|p| p.exists())
    });
    let data_path = sources
        .data_path
        .or_else(|| Some(base_dir.join("player-data.json")).filter(|p| p.exists()));

    let settings = settings_path.as_deref().and_then(load_auth_file);
    let player_data = data_path.as_deref().and_then(load_auth_file);

    let username = non_empty(sources.username)
        .or_else(|| settings.as_ref().and_then(|s| non_empty(s.username.clone())))
        .or_else(|| {
            player_data
                .as_ref()
                .and_then(|d| non_empty(d.service_username.clone()))
        });
    let token = non_empty(sources.token)
        .or_else(|| settings.as_ref().and_then(|s| non_empty(s.token.clone())))
        .or_else(|| {
            player_data
                .as_ref()
                .and_then(|d| non_empty(d.service_token.clone()))
        });

    match (username, token) {
        (Some(username), Some(token)) => Ok(Credentials { username, token }),
        _ => {
            let mut searched: Vec<String> = Vec::new();
            if let Some(p) = &settings_path {
                searched.push(p.display().to_string());
            }
            if let Some(p) = &data_path {
                searched.push(p.display().to_string());
            }
            let searched = if searched.is_empty() {
                "no default config files found".to_string()
            } else {
                searched.join(" and ")
            };
            Err(FactupError::Config {
                message: format!(
                    "username or token not found in cli args or parsed configs ({searched})"
                ),
            }
            .into())
        }
    }
}
