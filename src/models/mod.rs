//! Shared data model for one resolution/download session.
//!
//! The working set is a [`ModSet`]: a name-keyed, order-stable map of
//! [`ModState`] entries. States are created from manifest entries or
//! discovered transitively during resolution, mutated as the session
//! progresses, and never removed mid-session - everything still present at
//! the end is eligible for persistence.

use std::collections::BTreeMap;

use crate::registry::ModRelease;

/// Tracked state of a single mod across the session.
#[derive(Debug, Clone)]
pub struct ModState {
    /// Unique name within the working set (the portal's mod identifier)
    pub name: String,
    /// Display title; defaults to the name until metadata resolves it
    pub title: String,
    /// Whether the mod is enabled in mod-list.json
    pub enabled: bool,
    /// Whether an artifact for this mod is present on disk
    pub installed: bool,
    /// Version parsed from the on-disk artifact filename, if installed
    pub version: Option<String>,
    /// Latest platform-compatible release, once metadata has resolved
    pub latest: Option<ModRelease>,
    /// Whether the author has deprecated the mod on the portal
    pub deprecated: bool,
}

impl ModState {
    /// A mod read from the manifest.
    pub fn tracked(name: impl Into<String>, enabled: bool) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            enabled,
            installed: false,
            version: None,
            latest: None,
            deprecated: false,
        }
    }

    /// A mod discovered as a transitive dependency. Discovered mods start
    /// enabled and not installed.
    pub fn discovered(name: impl Into<String>) -> Self {
        Self::tracked(name, true)
    }

    /// Whether the latest resolved release differs from what is on disk.
    pub fn needs_update(&self) -> bool {
        match &self.latest {
            None => false,
            Some(latest) => {
                !self.installed || self.version.as_deref() != Some(latest.version.as_str())
            }
        }
    }

    /// Classify this mod for presentation.
    pub fn status(&self) -> ModStatus {
        if !self.enabled {
            ModStatus::Disabled
        } else if !self.installed {
            ModStatus::Missing
        } else if self.needs_update() {
            ModStatus::Outdated
        } else {
            ModStatus::Current
        }
    }
}

/// Presentation-level classification of a tracked mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModStatus {
    /// Tracked but disabled in the manifest
    Disabled,
    /// Enabled but no artifact on disk
    Missing,
    /// Installed at a version older than the latest compatible release
    Outdated,
    /// Installed at the latest compatible release
    Current,
}

/// The session working set, keyed by mod name.
///
/// A `BTreeMap` keeps iteration deterministic, which gives the resolver a
/// stable dispatch order and the manifest writer its sorted output for free.
pub type ModSet = BTreeMap<String, ModState>;

/// Snapshot of the working set ordered by display title, for rendering.
pub fn sorted_by_title(mods: &ModSet) -> Vec<&ModState> {
    let mut list: Vec<&ModState> = mods.values().collect();
    list.sort_by(|a, b| a.title.cmp(&b.title));
    list
}

/// True when at least one mod with a resolved release is missing or
/// out of date.
pub fn updates_available(mods: &ModSet) -> bool {
    mods.values().any(|m| m.needs_update())
}
