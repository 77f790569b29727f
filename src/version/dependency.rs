//! Parser for Mod Portal dependency-spec strings.
//!
//! Release metadata carries dependencies as plain strings in the form
//! `"[prefix ]name[ op version]"`, for example:
//!
//! ```text
//! base >= 1.1.0
//! ? optional-extras
//! (?) hidden-optional
//! !conflicting-mod
//! ~ required-no-load-order >= 2.0.0
//! flib
//! ```
//!
//! The parser is independent of any fetch logic so the prefix and
//! constraint handling can be tested in isolation.

use std::sync::LazyLock;

use regex::Regex;

/// `name [op version]` after the prefix has been stripped. Mod names may
/// contain word characters, spaces and hyphens.
static DEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[\w -]+?)(?: (?P<op>[<>]=?|=) (?P<ver>\d+\.\d+\.\d+))?$").unwrap()
});

/// How a dependency affects resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Must be present for the depending mod to load (`name` or `~ name`).
    Required,
    /// May be absent (`? name` or `(?) name`).
    Optional,
    /// Must not be present (`! name`).
    Incompatible,
}

/// Comparison operator of a version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `=`
    Exact,
    /// `>=`
    GreaterEq,
    /// `>`
    Greater,
}

impl ConstraintOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessEq),
            "=" => Some(Self::Exact),
            ">=" => Some(Self::GreaterEq),
            ">" => Some(Self::Greater),
            _ => None,
        }
    }
}

/// Optional `op version` tail of a dependency spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    /// The comparison operator
    pub op: ConstraintOp,
    /// The version literal, always `major.minor.patch`
    pub version: String,
}

/// A parsed dependency spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    /// Required, optional, or incompatible
    pub kind: DependencyKind,
    /// The referenced mod name
    pub name: String,
    /// Optional version constraint
    pub constraint: Option<VersionConstraint>,
}

impl DependencySpec {
    /// Parse a single dependency string.
    ///
    /// Returns `None` for strings that do not follow the portal's spec
    /// grammar; callers skip such entries rather than failing the mod.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        let (kind, rest) = if let Some(rest) = spec.strip_prefix("(?)") {
            (DependencyKind::Optional, rest)
        } else if let Some(rest) = spec.strip_prefix('!') {
            (DependencyKind::Incompatible, rest)
        } else if let Some(rest) = spec.strip_prefix('?') {
            (DependencyKind::Optional, rest)
        } else if let Some(rest) = spec.strip_prefix('~') {
            // "~" only relaxes load ordering; the dependency is still required.
            (DependencyKind::Required, rest)
        } else {
            (DependencyKind::Required, spec)
        };

        let caps = DEP_RE.captures(rest.trim_start())?;
        let name = caps.name("name")?.as_str().trim().to_string();
        if name.is_empty() {
            return None;
        }

        let constraint = match (caps.name("op"), caps.name("ver")) {
            (Some(op), Some(ver)) => Some(VersionConstraint {
                op: ConstraintOp::parse(op.as_str())?,
                version: ver.as_str().to_string(),
            }),
            _ => None,
        };

        Some(Self {
            kind,
            name,
            constraint,
        })
    }

    /// True when this dependency should pull the referenced mod into the
    /// working set.
    pub fn is_required(&self) -> bool {
        self.kind == DependencyKind::Required
    }
}
