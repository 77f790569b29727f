//! The download pipeline.
//!
//! For every mod with a resolved release, decide whether a fetch is
//! needed, run the needed downloads with bounded concurrency, and apply
//! the results to the working set once everything has settled. One mod's
//! failure never cancels its siblings, and the batch call does not return
//! until every launched download has completed or failed.
//!
//! After the downloads settle, superseded artifact files are pruned
//! sequentially (see [`prune`]).

pub mod checksum;
pub mod prune;

use std::path::Path;

use anyhow::Result;
use futures::StreamExt;
use futures::stream;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::core::FactupError;
use crate::models::ModSet;
use crate::registry::{ModRelease, PortalClient};

/// Result of one update batch.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Number of mods actually downloaded (validated no-ops excluded)
    pub updated: usize,
    /// Accumulated per-mod failures, in completion order
    pub errors: Vec<anyhow::Error>,
}

/// What happened to one mod inside the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    /// A new artifact was downloaded and installed
    Downloaded,
    /// The on-disk artifact was already current and passed verification
    Validated,
}

fn download_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}

/// Bring every mod with a resolved release up to date.
///
/// Per-mod decision:
/// - not installed → download
/// - installed at a different version → download
/// - installed at the latest version → verify the on-disk digest;
///   mismatch → re-download, match → validated no-op
/// - enabled with no resolved release → recorded as an error
///
/// Downloads run with at most `concurrency` in flight. Working-set
/// mutations happen strictly after the batch has settled, from the calling
/// task.
pub async fn update_all(
    client: &PortalClient,
    game_version: &str,
    mods: &mut ModSet,
    mod_dir: &Path,
    concurrency: usize,
    progress: Option<&MultiProgress>,
) -> UpdateReport {
    let mut report = UpdateReport::default();

    // Snapshot the inputs each worker needs so every worker owns its item
    // outright; only the joined results touch the shared set.
    let mut jobs: Vec<(String, String, Option<String>, ModRelease)> = Vec::new();
    for state in mods.values() {
        match &state.latest {
            Some(release) => jobs.push((
                state.name.clone(),
                state.title.clone(),
                state.installed.then(|| state.version.clone()).flatten(),
                release.clone(),
            )),
            None if state.enabled => report.errors.push(
                FactupError::ReleaseUnavailable {
                    name: state.name.clone(),
                    game_version: game_version.to_string(),
                }
                .into(),
            ),
            None => debug!(name = %state.name, "disabled mod has no resolved release, skipping"),
        }
    }

    let results: Vec<(String, String, Result<SyncOutcome>)> = stream::iter(jobs)
        .map(|(name, title, installed, release)| async move {
            let version = release.version.clone();
            let outcome =
                sync_mod(client, mod_dir, &name, &title, installed, &release, progress).await;
            (name, version, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    for (name, version, outcome) in results {
        match outcome {
            Ok(SyncOutcome::Downloaded) => {
                report.updated += 1;
                if let Some(state) = mods.get_mut(&name) {
                    state.installed = true;
                    state.version = Some(version);
                }
            }
            Ok(SyncOutcome::Validated) => {}
            Err(err) => report.errors.push(err),
        }
    }

    // Prune sequentially, and only toward artifacts that are confirmed
    // present; a failed download above leaves its older version alone.
    for state in mods.values() {
        let Some(release) = &state.latest else {
            continue;
        };
        if let Err(err) = prune::prune_old(mod_dir, &state.name, release) {
            report.errors.push(err.context(format!(
                "pruning old releases for '{}'",
                state.name
            )));
        }
    }

    report
}

async fn sync_mod(
    client: &PortalClient,
    mod_dir: &Path,
    name: &str,
    title: &str,
    installed_version: Option<String>,
    release: &ModRelease,
    progress: Option<&MultiProgress>,
) -> Result<SyncOutcome> {
    let target = mod_dir.join(release.safe_file_name()?);

    let needs_download = match installed_version.as_deref() {
        None => true,
        Some(v) if v != release.version => true,
        Some(_) => {
            // Same version on disk: trust it only if the digest holds up.
            if release.sha1.is_empty() || checksum::matches(&target, &release.sha1).await {
                false
            } else {
                info!(%name, "on-disk artifact failed verification, re-downloading");
                true
            }
        }
    };

    if !needs_download {
        debug!(%name, version = %release.version, "validated existing artifact");
        return Ok(SyncOutcome::Validated);
    }

    let bar = progress.map(|multi| {
        let bar = multi.add(ProgressBar::new(0));
        bar.set_style(download_style());
        bar.set_prefix(format!("{title} ({})", release.version));
        bar
    });

    let result = client
        .download_release(name, release, mod_dir, bar.as_ref())
        .await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    result?;
    info!(%name, version = %release.version, "downloaded");
    Ok(SyncOutcome::Downloaded)
}
