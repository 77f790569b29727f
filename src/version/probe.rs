//! Installed game version detection.
//!
//! Runs the local Factorio binary with `--version` under a short deadline
//! and extracts `major.minor` from its output. The deadline keeps a hung
//! or misbehaving binary from blocking startup indefinitely.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::constants::VERSION_PROBE_TIMEOUT;
use crate::core::FactupError;

/// First line of `factorio --version` output, e.g.
/// `Version: 1.1.110 (build 62560, linux64, headless)`.
static GAME_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Version: (\d+)\.(\d+)\.\d+").unwrap());

/// Probe the Factorio binary at `binary` and return its `major.minor`
/// version string.
///
/// Fatal: an unreachable binary, a probe timeout, or unparsable output all
/// abort startup with [`FactupError::VersionProbe`].
pub async fn detect_game_version(binary: &Path) -> Result<String> {
    let output = timeout(
        VERSION_PROBE_TIMEOUT,
        Command::new(binary).arg("--version").output(),
    )
    .await
    .map_err(|_| FactupError::VersionProbe {
        reason: format!(
            "'{}' did not respond within {}s",
            binary.display(),
            VERSION_PROBE_TIMEOUT.as_secs()
        ),
    })?
    .map_err(|e| FactupError::VersionProbe {
        reason: format!("running '{}': {e}", binary.display()),
    })?;

    // Some builds print the banner to stderr, so inspect both streams.
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    let caps = GAME_VERSION_RE
        .captures(&text)
        .ok_or_else(|| FactupError::VersionProbe {
            reason: format!("could not parse version from binary output: {}", text.trim()),
        })?;

    let version = format!("{}.{}", &caps[1], &caps[2]);
    debug!(%version, binary = %binary.display(), "detected factorio version");
    Ok(version)
}
