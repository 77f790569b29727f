//! One end-to-end update session.
//!
//! An [`Updater`] owns everything a session needs: the portal client with
//! resolved credentials, the probed game version, the mods directory, and
//! the working set loaded from the manifest and on-disk inventory.
//! Construction performs all the fatal checks up front (credentials,
//! version probe, manifest); after that the phases are non-fatal and
//! accumulate per-mod errors in their reports.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use tracing::info;

use crate::config::{CredentialSources, resolve_credentials};
use crate::constants::{DEFAULT_DOWNLOAD_CONCURRENCY, DEFAULT_FETCH_CONCURRENCY};
use crate::installer::{self, UpdateReport};
use crate::manifest;
use crate::models::ModSet;
use crate::registry::PortalClient;
use crate::resolver::{self, ResolveReport};
use crate::version::probe::detect_game_version;

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct UpdaterOptions {
    /// Directory holding mod-list.json and the artifact files
    pub mod_dir: PathBuf,
    /// Factorio binary to probe for the game version
    pub binary: PathBuf,
    /// Base URL of the mod portal
    pub portal_url: String,
    /// Credential flags and file overrides
    pub credentials: CredentialSources,
    /// In-flight metadata fetches per wave
    pub fetch_concurrency: usize,
    /// In-flight artifact downloads
    pub download_concurrency: usize,
}

impl UpdaterOptions {
    /// Options with default concurrency limits.
    pub fn new(mod_dir: PathBuf, binary: PathBuf, portal_url: String) -> Self {
        Self {
            mod_dir,
            binary,
            portal_url,
            credentials: CredentialSources::default(),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
        }
    }
}

/// A fully initialized update session.
pub struct Updater {
    client: PortalClient,
    mod_dir: PathBuf,
    game_version: String,
    mods: ModSet,
    fetch_concurrency: usize,
    download_concurrency: usize,
}

impl Updater {
    /// Open a session: resolve credentials, probe the game version, and
    /// load the manifest plus the on-disk inventory.
    ///
    /// Any failure here is fatal - without credentials, a game version, or
    /// a readable manifest there is nothing to update.
    pub async fn open(options: UpdaterOptions) -> Result<Self> {
        let credentials = resolve_credentials(&options.mod_dir, options.credentials)
            .context("resolving portal credentials")?;

        let game_version = detect_game_version(&options.binary)
            .await
            .with_context(|| format!("probing {}", options.binary.display()))?;
        info!(%game_version, "detected game version");

        let client = PortalClient::new(&options.portal_url, credentials)
            .context("creating portal client")?;

        let mods = manifest::load_with_inventory(&options.mod_dir)?;
        info!(count = mods.len(), "loaded tracked mods");

        Ok(Self {
            client,
            mod_dir: options.mod_dir,
            game_version,
            mods,
            fetch_concurrency: options.fetch_concurrency,
            download_concurrency: options.download_concurrency,
        })
    }

    /// Fetch metadata for the whole working set, expanding it with
    /// transitive dependencies until it is closed.
    pub async fn resolve_metadata(&mut self) -> ResolveReport {
        resolver::resolve_all(
            &self.client,
            &self.game_version,
            &mut self.mods,
            self.fetch_concurrency,
        )
        .await
    }

    /// Download everything that needs it, prune superseded artifacts, and
    /// persist the final working set back to mod-list.json.
    ///
    /// A failed persistence does not undo the downloads; it is appended to
    /// the report like any other error.
    pub async fn update_mods(&mut self, progress: Option<&MultiProgress>) -> UpdateReport {
        let mut report = installer::update_all(
            &self.client,
            &self.game_version,
            &mut self.mods,
            &self.mod_dir,
            self.download_concurrency,
            progress,
        )
        .await;

        if let Err(err) = manifest::save(&self.mod_dir, &self.mods) {
            report.errors.push(err.context("persisting mod-list.json"));
        }

        report
    }

    /// The probed `major.minor` game version.
    pub fn game_version(&self) -> &str {
        &self.game_version
    }

    /// The current working set.
    pub fn mods(&self) -> &ModSet {
        &self.mods
    }

    /// The mods directory this session operates on.
    pub fn mod_dir(&self) -> &Path {
        &self.mod_dir
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn fake_binary(dir: &Path, output: &str) -> PathBuf {
        let path = dir.join("factorio");
        std::fs::write(&path, format!("#!/bin/sh\necho \"{output}\"\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn options(root: &TempDir) -> UpdaterOptions {
        let mod_dir = root.path().join("mods");
        std::fs::create_dir_all(&mod_dir).unwrap();
        std::fs::write(
            mod_dir.join("mod-list.json"),
            r#"{"mods":[{"name":"base","enabled":true},{"name":"helmod","enabled":true}]}"#,
        )
        .unwrap();
        let binary = fake_binary(
            root.path(),
            "Version: 2.0.28 (build 80571, linux64, headless)",
        );
        let mut opts = UpdaterOptions::new(mod_dir, binary, "http://127.0.0.1:9".to_string());
        opts.credentials.username = Some("user".to_string());
        opts.credentials.token = Some("token".to_string());
        opts
    }

    #[tokio::test]
    async fn open_probes_version_and_loads_manifest() {
        let root = TempDir::new().unwrap();
        let updater = Updater::open(options(&root)).await.unwrap();
        assert_eq!(updater.game_version(), "2.0");
        assert_eq!(updater.mods().len(), 1);
        assert!(updater.mods().contains_key("helmod"));
    }

    #[tokio::test]
    async fn open_fails_without_credentials() {
        let root = TempDir::new().unwrap();
        let mut opts = options(&root);
        opts.credentials = CredentialSources::default();
        assert!(Updater::open(opts).await.is_err());
    }

    #[tokio::test]
    async fn open_fails_without_manifest() {
        let root = TempDir::new().unwrap();
        let opts = options(&root);
        std::fs::remove_file(opts.mod_dir.join("mod-list.json")).unwrap();
        assert!(Updater::open(opts).await.is_err());
    }

    #[tokio::test]
    async fn update_persists_manifest_even_on_failures() {
        let root = TempDir::new().unwrap();
        let mut updater = Updater::open(options(&root)).await.unwrap();

        // Resolution against the unreachable portal fails per-mod.
        let resolve = updater.resolve_metadata().await;
        assert_eq!(resolve.errors.len(), 1);

        let report = updater.update_mods(None).await;
        assert_eq!(report.updated, 0);
        // helmod is enabled with no resolved release.
        assert!(!report.errors.is_empty());

        // The manifest was still written (and a backup of the original kept).
        let data = std::fs::read(updater.mod_dir().join("mod-list.json")).unwrap();
        let list: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(list["mods"][0]["name"], "helmod");
    }
}
