//! mod-list.json persistence and local artifact inventory.
//!
//! The manifest is Factorio's own `mod-list.json`:
//!
//! ```json
//! { "mods": [ { "name": "helmod", "enabled": true } ] }
//! ```
//!
//! Loading builds the initial working set (built-in names are dropped and
//! never queried remotely), scanning the mods directory fills in the
//! installed/version state from artifact filenames, and saving persists the
//! final tracked set atomically with a timestamped backup of the previous
//! file.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::Local;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::FactupError;
use crate::models::{ModSet, ModState};
use crate::version::ModVersion;

/// Canonical manifest filename inside the mods directory.
pub const MOD_LIST_FILE: &str = "mod-list.json";

/// Mods shipped with the game or its official expansions. These are never
/// tracked and never queried on the portal. Matching is case-sensitive.
pub const BUILTIN_MODS: [&str; 5] = ["base", "core", "elevated-rails", "quality", "space-age"];

/// Installed artifact filenames: `<name>_<major>.<minor>.<patch>.zip`.
static MOD_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)_(\d+\.\d+\.\d+)\.zip$").unwrap());

#[derive(Debug, Serialize, Deserialize)]
struct ModListFile {
    mods: Vec<ModListEntry>,
}

/// One `{name, enabled}` pair in mod-list.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModListEntry {
    /// Mod name as known to the portal
    pub name: String,
    /// Whether the game should load the mod
    pub enabled: bool,
}

/// True for names belonging to the base game or official expansions.
pub fn is_builtin(name: &str) -> bool {
    BUILTIN_MODS.contains(&name)
}

/// Read `mod_dir/mod-list.json` into a fresh working set.
///
/// Built-in entries are dropped. An unreadable or malformed manifest is a
/// fatal configuration error - there is nothing sensible to resolve
/// without it.
pub fn load(mod_dir: &Path) -> Result<ModSet> {
    let path = mod_dir.join(MOD_LIST_FILE);
    let data = std::fs::read(&path).map_err(|e| FactupError::Config {
        message: format!("reading {}: {e}", path.display()),
    })?;

    let list: ModListFile = serde_json::from_slice(&data).map_err(|e| {
        FactupError::ManifestParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut mods = ModSet::new();
    for entry in list.mods {
        if is_builtin(&entry.name) {
            debug!(name = %entry.name, "skipping built-in mod");
            continue;
        }
        mods.insert(entry.name.clone(), ModState::tracked(entry.name, entry.enabled));
    }
    Ok(mods)
}

/// Scan `mod_dir` for installed artifacts and mark matching tracked mods.
///
/// Files that do not follow the `<name>_<x.y.z>.zip` convention, or that
/// belong to untracked names, are ignored. An unreadable directory is also
/// ignored: a missing mods directory just means nothing is installed yet.
pub fn scan_installed(mod_dir: &Path, mods: &mut ModSet) {
    let entries = match std::fs::read_dir(mod_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %mod_dir.display(), error = %e, "mods directory not scannable");
            return;
        }
    };

    for entry in entries.flatten() {
        if entry.path().is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(caps) = MOD_ZIP_RE.captures(file_name) else {
            continue;
        };
        if let Some(state) = mods.get_mut(&caps[1]) {
            let candidate = caps[2].to_string();
            // Several versions of one mod can coexist on disk; record the
            // highest regardless of directory iteration order.
            let keep = match &state.version {
                Some(existing) => ModVersion::parse(&candidate) > ModVersion::parse(existing),
                None => true,
            };
            if keep {
                state.installed = true;
                state.version = Some(candidate);
            }
        }
    }
}

/// Persist the working set back to `mod_dir/mod-list.json`.
///
/// Entries are written sorted by name for deterministic output. The
/// previous manifest is first renamed to a timestamped backup (best-effort:
/// a failed backup is only a warning). The new content goes to a temporary
/// file in the same directory and is atomically renamed over the canonical
/// path, so no reader ever observes a partially written manifest.
pub fn save(mod_dir: &Path, mods: &ModSet) -> Result<()> {
    // BTreeMap iteration is already name-ordered.
    let out = ModListFile {
        mods: mods
            .values()
            .map(|m| ModListEntry {
                name: m.name.clone(),
                enabled: m.enabled,
            })
            .collect(),
    };

    let path = mod_dir.join(MOD_LIST_FILE);
    if path.exists() {
        let backup = backup_path(mod_dir);
        if let Err(e) = std::fs::rename(&path, &backup) {
            warn!(error = %e, "failed to back up {}", path.display());
        }
    }

    let bytes = serde_json::to_vec_pretty(&out).map_err(|e| FactupError::Persistence {
        reason: format!("serializing mod-list: {e}"),
    })?;

    let tmp = NamedTempFile::new_in(mod_dir).map_err(|e| FactupError::Persistence {
        reason: format!("creating temporary file in {}: {e}", mod_dir.display()),
    })?;
    std::fs::write(tmp.path(), &bytes).map_err(|e| FactupError::Persistence {
        reason: format!("writing temporary mod-list: {e}"),
    })?;
    tmp.persist(&path).map_err(|e| FactupError::Persistence {
        reason: format!("renaming mod-list into place: {e}"),
    })?;

    debug!(path = %path.display(), count = mods.len(), "persisted mod-list");
    Ok(())
}

fn backup_path(mod_dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H%M.%S");
    mod_dir.join(format!("mod-list.{stamp}.json"))
}

/// Load the manifest and fold in the on-disk inventory in one step.
pub fn load_with_inventory(mod_dir: &Path) -> Result<ModSet> {
    let mut mods = load(mod_dir).context("loading mod-list.json")?;
    scan_installed(mod_dir, &mut mods);
    Ok(mods)
}
