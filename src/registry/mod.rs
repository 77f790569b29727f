//! Mod Portal HTTP client.
//!
//! Two endpoints matter to the engine:
//!
//! - `GET {base}/api/mods/{name}/full` - per-mod metadata including the
//!   release list, decoded into [`ModMetadata`] with the body capped at
//!   [`MAX_METADATA_BYTES`]
//! - `GET {base}{download_url}?username=..&token=..` - the artifact
//!   itself, streamed straight to disk with a running SHA-1
//!
//! All requests carry per-request deadlines; the client itself only owns
//! the connect timeout and the connection pool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use futures::StreamExt;
use indicatif::ProgressBar;
use reqwest::Url;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::Credentials;
use crate::constants::{CONNECT_TIMEOUT, DOWNLOAD_TIMEOUT, MAX_METADATA_BYTES, METADATA_TIMEOUT};
use crate::core::FactupError;

/// Response payload of `/api/mods/{name}/full`, trimmed to the fields the
/// engine consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModMetadata {
    /// Human-readable mod title
    #[serde(default)]
    pub title: String,
    /// Whether the author has deprecated the mod
    #[serde(default)]
    pub deprecated: bool,
    /// All published releases, oldest first by portal convention. The
    /// resolver must not rely on that ordering.
    #[serde(default)]
    pub releases: Vec<ModRelease>,
}

/// A single versioned release artifact.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModRelease {
    /// Portal-relative download path, e.g. `/download/helmod/5e9f...`
    pub download_url: String,
    /// Artifact filename, `<name>_<version>.zip`
    pub file_name: String,
    /// Release version, always `major.minor.patch`
    pub version: String,
    /// Hex-encoded SHA-1 digest of the artifact
    #[serde(default)]
    pub sha1: String,
    /// Embedded info.json fragment
    #[serde(default)]
    pub info_json: InfoJson,
}

impl ModRelease {
    /// The artifact filename with any directory components stripped.
    ///
    /// The portal controls `file_name`, so treat it as untrusted and never
    /// let it traverse out of the mods directory.
    pub fn safe_file_name(&self) -> Result<String> {
        Path::new(&self.file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty() && n != "." && n != "..")
            .ok_or_else(|| anyhow!("release has unusable file name: {:?}", self.file_name))
    }
}

/// The slice of a release's `info.json` the resolver needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfoJson {
    /// Game version this release targets (`major.minor`)
    #[serde(default)]
    pub factorio_version: String,
    /// Raw dependency-spec strings
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// HTTP client for one Mod Portal, carrying the download credentials.
#[derive(Debug, Clone)]
pub struct PortalClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl PortalClient {
    /// Build a client for the portal at `base_url`.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid portal URL: {base_url}"))?;
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    fn metadata_url(&self, name: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("portal URL cannot carry a path"))?
            .extend(["api", "mods", name, "full"]);
        Ok(url)
    }

    fn download_url(&self, release: &ModRelease) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&release.download_url)
            .with_context(|| format!("invalid download path {:?}", release.download_url))?;
        url.query_pairs_mut()
            .append_pair("username", &self.credentials.username)
            .append_pair("token", &self.credentials.token);
        Ok(url)
    }

    /// Fetch and decode the full metadata for `name`.
    ///
    /// Network failure, a non-success status, an oversized body and a
    /// malformed body are all reported as errors; the caller accumulates
    /// them per mod instead of aborting its batch.
    pub async fn fetch_mod(&self, name: &str) -> Result<ModMetadata> {
        let url = self.metadata_url(name)?;
        debug!(%name, %url, "fetching mod metadata");

        let resp = self
            .http
            .get(url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("fetching metadata for '{name}'"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FactupError::PortalStatus {
                name: name.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        // Read the body incrementally so the cap is enforced before the
        // whole response is buffered.
        let mut body = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.with_context(|| format!("reading metadata for '{name}'"))?;
            if body.len() + chunk.len() > MAX_METADATA_BYTES {
                return Err(FactupError::MetadataTooLarge {
                    name: name.to_string(),
                    limit: MAX_METADATA_BYTES,
                }
                .into());
            }
            body.extend_from_slice(&chunk);
        }

        serde_json::from_slice(&body).map_err(|e| {
            FactupError::MetadataDecode {
                name: name.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Download `release` into `mod_dir`, verifying its SHA-1 on the way.
    ///
    /// The body is streamed into `<file_name>.part` in the target directory
    /// while a running digest is computed. On digest mismatch the partial
    /// file is deleted and the item fails; on success the temp file is
    /// atomically renamed over the final path. A previously installed
    /// version with a different filename is never touched, so a failed
    /// download cannot corrupt a working installation.
    pub async fn download_release(
        &self,
        name: &str,
        release: &ModRelease,
        mod_dir: &Path,
        progress: Option<&ProgressBar>,
    ) -> Result<PathBuf> {
        let file_name = release.safe_file_name()?;
        let target = mod_dir.join(&file_name);
        let tmp_path = mod_dir.join(format!("{file_name}.part"));

        let result = self
            .stream_to_file(name, release, &tmp_path, progress)
            .await;
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        fs::rename(&tmp_path, &target).await.with_context(|| {
            format!("renaming {} into place", tmp_path.display())
        })?;
        debug!(%name, target = %target.display(), "download complete");
        Ok(target)
    }

    async fn stream_to_file(
        &self,
        name: &str,
        release: &ModRelease,
        tmp_path: &Path,
        progress: Option<&ProgressBar>,
    ) -> Result<()> {
        let url = self.download_url(release)?;
        let resp = self
            .http
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| FactupError::DownloadFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FactupError::DownloadFailed {
                name: name.to_string(),
                reason: format!("portal returned status {status}"),
            }
            .into());
        }

        if let (Some(pb), Some(len)) = (progress, resp.content_length()) {
            pb.set_length(len);
        }

        let mut out = fs::File::create(tmp_path)
            .await
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        let mut hasher = Sha1::new();
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FactupError::DownloadFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
            hasher.update(&chunk);
            out.write_all(&chunk)
                .await
                .with_context(|| format!("writing {}", tmp_path.display()))?;
            if let Some(pb) = progress {
                pb.inc(chunk.len() as u64);
            }
        }
        out.flush().await?;
        drop(out);

        if release.sha1.is_empty() {
            // No digest published; nothing to verify against.
            warn!(%name, "portal published no sha1 digest, skipping verification");
            return Ok(());
        }

        let actual = hex::encode(hasher.finalize());
        if !actual.eq_ignore_ascii_case(&release.sha1) {
            return Err(FactupError::ChecksumMismatch {
                file: tmp_path.display().to_string(),
                expected: release.sha1.clone(),
                actual,
            }
            .into());
        }

        Ok(())
    }
}
