//! Version parsing and game-compatibility matching.
//!
//! Factorio mod releases declare the game version they target as
//! `major.minor` (occasionally `major.minor.patch`), while the installed
//! game version probed from the binary carries only `major.minor`. This
//! module parses both leniently and answers the single question the
//! resolver cares about: is a given release usable on the installed game?
//!
//! The matching rules are deliberately simple - there is no general semver
//! range solver here. See [`is_compatible`] for the exact semantics,
//! including the historical `1.x` ↔ `0.18` equivalence.

pub mod dependency;
pub mod probe;

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Lenient `major.minor[.patch]` pattern. Matches anywhere in the input so
/// strings like `"Version: 2.0.28 (build 80805)"` parse without pre-trimming.
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap());

/// A parsed `major.minor[.patch]` version.
///
/// Ordering treats an absent patch component as zero, so `2.0` and `2.0.0`
/// compare equal and `2.0.28 > 2.0.9` compares numerically rather than
/// lexically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModVersion {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Optional patch component (mod releases have it, game versions may not)
    pub patch: Option<u64>,
}

impl ModVersion {
    /// Parse the first `major.minor[.patch]` occurrence in `input`.
    ///
    /// Returns `None` when no version-shaped substring is present or a
    /// component overflows `u64`.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(input)?;
        let major = caps.get(1)?.as_str().parse().ok()?;
        let minor = caps.get(2)?.as_str().parse().ok()?;
        let patch = match caps.get(3) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    fn sort_key(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch.unwrap_or(0))
    }
}

impl Ord for ModVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ModVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ModVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Decide whether a release targeting `release_version` runs on the
/// installed game version `game_version`.
///
/// Rules, in order:
/// 1. Either side failing to parse as `major.minor[.patch]` → incompatible.
/// 2. Legacy bridge: any `1.x` game accepts any `0.18*` release. Factorio
///    1.0 was the direct continuation of 0.18, and mods targeting 0.18
///    remained loadable.
/// 3. A release that pins a patch component requires full string equality
///    with the game version. Game versions carry only `major.minor`, so
///    patch-pinned releases rarely match. This mirrors the portal's own
///    behavior and is intentionally left as-is.
/// 4. Otherwise major and minor must both be equal.
///
/// Pure and deterministic; no I/O.
pub fn is_compatible(game_version: &str, release_version: &str) -> bool {
    let (Some(game), Some(release)) = (
        ModVersion::parse(game_version),
        ModVersion::parse(release_version),
    ) else {
        return false;
    };

    if game_version.starts_with("1.") && release_version.starts_with("0.18") {
        return true;
    }

    if release.patch.is_some() {
        return release_version == game_version;
    }

    game.major == release.major && game.minor == release.minor
}
