//! Error handling for factup.
//!
//! The error system follows a two-tier design:
//! 1. [`FactupError`] - strongly-typed variants for every failure mode the
//!    engine can classify, used where callers need to branch on the cause
//! 2. [`anyhow::Error`] with `.context()` at operation boundaries for
//!    everything else
//!
//! # Fatal vs accumulated errors
//!
//! Startup failures (unreadable configuration, an unprobeable Factorio
//! binary) abort immediately. Per-mod failures during metadata resolution
//! or download never abort the batch: they are collected into the
//! operation's report and surfaced together with whatever partial progress
//! succeeded. The fatal/non-fatal judgment on accumulated errors belongs to
//! the caller, not to the engine.

use thiserror::Error;

/// The main error type for factup operations.
///
/// Variants are grouped by lifecycle phase: configuration and version
/// probing (fatal at startup), portal metadata (accumulated per mod),
/// download and verification (accumulated per mod), and persistence
/// (reported, never rolls back completed downloads).
#[derive(Error, Debug)]
pub enum FactupError {
    /// Configuration error (credentials, paths, CLI argument combinations).
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// The mod-list.json manifest could not be parsed.
    #[error("invalid mod-list syntax in {file}: {reason}")]
    ManifestParse {
        /// Path to the manifest that failed to parse
        file: String,
        /// Specific reason for the parsing failure
        reason: String,
    },

    /// The local Factorio binary could not be probed for its version.
    #[error("could not determine factorio version: {reason}")]
    VersionProbe {
        /// Why the probe failed (unreachable binary, timeout, unparsable output)
        reason: String,
    },

    /// The Mod Portal returned a non-success HTTP status.
    #[error("mod portal returned status {status} for '{name}'")]
    PortalStatus {
        /// The mod whose metadata request failed
        name: String,
        /// The HTTP status code
        status: u16,
    },

    /// A metadata response body exceeded the configured size cap.
    #[error("metadata response for '{name}' exceeded {limit} bytes")]
    MetadataTooLarge {
        /// The mod whose response was oversized
        name: String,
        /// The configured cap in bytes
        limit: usize,
    },

    /// A metadata response body was not valid JSON for the expected schema.
    #[error("failed to decode metadata for '{name}': {reason}")]
    MetadataDecode {
        /// The mod whose response failed to decode
        name: String,
        /// The underlying decode error
        reason: String,
    },

    /// An enabled mod has no release compatible with the installed game version.
    #[error("no release of '{name}' is compatible with factorio {game_version}")]
    ReleaseUnavailable {
        /// The mod without a usable release
        name: String,
        /// The installed game version the releases were matched against
        game_version: String,
    },

    /// A downloaded or on-disk artifact did not match its published digest.
    #[error("sha1 mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The artifact file that failed verification
        file: String,
        /// The digest published by the portal
        expected: String,
        /// The digest computed from the local bytes
        actual: String,
    },

    /// An artifact download failed (network, stream, or filesystem error).
    #[error("download failed for '{name}': {reason}")]
    DownloadFailed {
        /// The mod whose download failed
        name: String,
        /// The underlying failure
        reason: String,
    },

    /// The mod-list manifest could not be persisted.
    #[error("failed to persist mod-list: {reason}")]
    Persistence {
        /// The underlying write/rename failure
        reason: String,
    },

    /// I/O error from [`std::io::Error`].
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error from [`reqwest::Error`].
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error from [`serde_json::Error`].
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FactupError {
    /// Convenience constructor for [`FactupError::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_mod_name() {
        let err = FactupError::PortalStatus {
            name: "helmod".to_string(),
            status: 404,
        };
        assert_eq!(err.to_string(), "mod portal returned status 404 for 'helmod'");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FactupError = io.into();
        assert!(matches!(err, FactupError::Io(_)));
    }
}
