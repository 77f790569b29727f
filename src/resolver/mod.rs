//! Metadata resolution and transitive dependency discovery.
//!
//! Resolution runs in waves. Each wave fetches metadata for a set of names
//! with bounded parallelism, joins every fetch (the wave barrier), applies
//! the results to the working set, and then derives the names that are
//! referenced as required dependencies but not yet tracked. Missing names
//! are added as fresh enabled entries and become the next wave. The
//! dependency graph is finite and every wave strictly adds new names, so
//! the loop terminates even when the graph contains cycles - re-adding an
//! already-present name is a no-op.
//!
//! Per-mod fetch failures are accumulated in the returned report and never
//! abort the batch; a mod whose fetch failed simply ends the session with
//! no resolved release.

use std::collections::BTreeSet;

use anyhow::Result;
use futures::StreamExt;
use futures::stream;
use tracing::{debug, warn};

use crate::manifest::is_builtin;
use crate::models::{ModSet, ModState};
use crate::registry::{ModMetadata, ModRelease, PortalClient};
use crate::version::dependency::DependencySpec;
use crate::version::{ModVersion, is_compatible};

/// Accumulated non-fatal failures from one resolution session.
#[derive(Debug, Default)]
pub struct ResolveReport {
    /// Per-mod fetch/decode errors, in completion order
    pub errors: Vec<anyhow::Error>,
}

impl ResolveReport {
    /// True when every fetch in every wave succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Select the latest release compatible with `game_version`.
///
/// Candidates are filtered through [`is_compatible`] and the winner is the
/// one with the highest parsed version - an explicit comparison, never the
/// portal's response order. Releases with unparsable versions are skipped.
pub fn select_release<'a>(releases: &'a [ModRelease], game_version: &str) -> Option<&'a ModRelease> {
    releases
        .iter()
        .filter(|r| is_compatible(game_version, &r.info_json.factorio_version))
        .filter_map(|r| ModVersion::parse(&r.version).map(|v| (v, r)))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, r)| r)
}

/// Apply one fetched metadata payload to its working-set entry.
fn apply_metadata(state: &mut ModState, meta: &ModMetadata, game_version: &str) {
    if !meta.title.is_empty() {
        state.title = meta.title.clone();
    }
    state.deprecated = meta.deprecated;
    state.latest = select_release(&meta.releases, game_version).cloned();
    if state.latest.is_none() {
        debug!(name = %state.name, %game_version, "no compatible release");
    }
}

/// Derive the set of required dependency names referenced by resolved
/// releases but absent from the working set.
///
/// Optional (`?`, `(?)`) and incompatible (`!`) specs are skipped, as are
/// built-in names and specs that fail to parse.
pub fn missing_dependencies(mods: &ModSet) -> BTreeSet<String> {
    let mut missing = BTreeSet::new();
    for state in mods.values() {
        let Some(release) = &state.latest else {
            continue;
        };
        for raw in &release.info_json.dependencies {
            let Some(dep) = DependencySpec::parse(raw) else {
                warn!(spec = %raw, from = %state.name, "unparsable dependency spec");
                continue;
            };
            if !dep.is_required() || is_builtin(&dep.name) {
                continue;
            }
            if !mods.contains_key(&dep.name) {
                missing.insert(dep.name);
            }
        }
    }
    missing
}

/// Fetch metadata for every mod in the working set and iteratively expand
/// it with transitive dependencies until no new names appear.
///
/// `concurrency` bounds the in-flight fetches per wave. The call returns
/// only after every launched fetch has settled; results are applied to the
/// working set strictly between waves, so no per-mod state is ever mutated
/// while a sibling fetch is running.
pub async fn resolve_all(
    client: &PortalClient,
    game_version: &str,
    mods: &mut ModSet,
    concurrency: usize,
) -> ResolveReport {
    let mut report = ResolveReport::default();
    let mut pending: Vec<String> = mods.keys().cloned().collect();
    let mut wave = 0usize;

    while !pending.is_empty() {
        debug!(wave, count = pending.len(), "fetching metadata wave");

        // The wave barrier: collect() joins every fetch before any result
        // is applied, and the shared accumulator is only touched from this
        // single task afterwards.
        let results: Vec<(String, Result<ModMetadata>)> = stream::iter(pending)
            .map(|name| async move {
                let meta = client.fetch_mod(&name).await;
                (name, meta)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        for (name, result) in results {
            match result {
                Ok(meta) => {
                    if let Some(state) = mods.get_mut(&name) {
                        apply_metadata(state, &meta, game_version);
                    }
                }
                Err(err) => report.errors.push(err),
            }
        }

        let missing = missing_dependencies(mods);
        pending = missing
            .into_iter()
            .map(|name| {
                debug!(%name, "discovered transitive dependency");
                mods.insert(name.clone(), ModState::discovered(&name));
                name
            })
            .collect();
        wave += 1;
    }

    report
}
