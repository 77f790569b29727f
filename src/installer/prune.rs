//! Removal of superseded artifact files.
//!
//! Pruning for a mod only runs once its latest-version artifact is
//! confirmed present on disk - never prune toward a successor that does
//! not exist. Files belonging to other mods are never considered.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::info;

use crate::registry::ModRelease;

/// Delete every `<name>_<x.y.z>.zip` in `mod_dir` whose version differs
/// from `latest.version`, provided the latest artifact itself exists.
///
/// Returns the file names that were removed.
pub fn prune_old(mod_dir: &Path, name: &str, latest: &ModRelease) -> Result<Vec<String>> {
    let latest_file = latest.safe_file_name()?;
    if !mod_dir.join(&latest_file).exists() {
        // Latest was not downloaded or has gone missing; leave everything.
        return Ok(Vec::new());
    }

    let pattern = Regex::new(&format!(
        r"^{}_(\d+\.\d+\.\d+)\.zip$",
        regex::escape(name)
    ))
    .context("building prune pattern")?;

    let mut removed = Vec::new();
    let entries = std::fs::read_dir(mod_dir)
        .with_context(|| format!("reading mod directory {}", mod_dir.display()))?;

    for entry in entries.flatten() {
        if entry.path().is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(caps) = pattern.captures(file_name) else {
            continue;
        };
        if &caps[1] == latest.version {
            continue;
        }
        std::fs::remove_file(entry.path())
            .with_context(|| format!("removing {file_name}"))?;
        info!(%name, file = %file_name, "removed superseded release");
        removed.push(file_name.to_string());
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModRelease;
    use tempfile::TempDir;

    fn latest(name: &str, version: &str) -> ModRelease {
        ModRelease {
            file_name: format!("{name}_{version}.zip"),
            version: version.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn removes_only_superseded_versions_of_the_mod() {
        let dir = TempDir::new().unwrap();
        for f in ["x_2.1.0.zip", "x_2.1.5.zip", "x_2.2.12.zip", "y_0.4.15.zip"] {
            std::fs::write(dir.path().join(f), b"zip").unwrap();
        }

        let mut removed = prune_old(dir.path(), "x", &latest("x", "2.2.12")).unwrap();
        removed.sort();
        assert_eq!(removed, vec!["x_2.1.0.zip", "x_2.1.5.zip"]);
        assert!(dir.path().join("x_2.2.12.zip").exists());
        assert!(dir.path().join("y_0.4.15.zip").exists());
    }

    #[test]
    fn noop_when_latest_artifact_absent() {
        let dir = TempDir::new().unwrap();
        for f in ["x_2.1.0.zip", "x_2.1.5.zip"] {
            std::fs::write(dir.path().join(f), b"zip").unwrap();
        }

        let removed = prune_old(dir.path(), "x", &latest("x", "2.2.12")).unwrap();
        assert!(removed.is_empty());
        assert!(dir.path().join("x_2.1.0.zip").exists());
        assert!(dir.path().join("x_2.1.5.zip").exists());
    }

    #[test]
    fn regex_metacharacters_in_name_are_escaped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.b_1.0.0.zip"), b"zip").unwrap();
        std::fs::write(dir.path().join("axb_0.9.0.zip"), b"zip").unwrap();
        std::fs::write(dir.path().join("a.b_0.9.0.zip"), b"zip").unwrap();

        let removed = prune_old(dir.path(), "a.b", &latest("a.b", "1.0.0")).unwrap();
        assert_eq!(removed, vec!["a.b_0.9.0.zip"]);
        // "axb" must not be treated as matching "a.b".
        assert!(dir.path().join("axb_0.9.0.zip").exists());
    }
}
