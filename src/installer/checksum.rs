//! SHA-1 digest computation for on-disk artifacts.
//!
//! The Mod Portal publishes SHA-1 digests for every release artifact; this
//! is the only trust mechanism in play. Artifacts are a few megabytes at
//! most, so reading the whole file before hashing is fine.

use std::path::Path;

use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use tokio::fs;

/// Compute the hex-encoded SHA-1 digest of the file at `path`.
pub async fn sha1_hex(path: &Path) -> Result<String> {
    let contents = fs::read(path)
        .await
        .with_context(|| format!("reading {} for digest", path.display()))?;
    Ok(hex::encode(Sha1::digest(&contents)))
}

/// Whether the file at `path` matches the expected hex digest.
///
/// An unreadable file counts as a mismatch - the caller's response in both
/// cases is a re-download.
pub async fn matches(path: &Path, expected: &str) -> bool {
    match sha1_hex(path).await {
        Ok(actual) => actual.eq_ignore_ascii_case(expected),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn digest_matches_known_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.zip");
        std::fs::write(&path, b"hello world").unwrap();

        // sha1("hello world")
        let expected = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";
        assert_eq!(sha1_hex(&path).await.unwrap(), expected);
        assert!(matches(&path, expected).await);
        assert!(matches(&path, &expected.to_uppercase()).await);
    }

    #[tokio::test]
    async fn single_byte_mutation_fails_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact.zip");
        std::fs::write(&path, b"hello world").unwrap();
        let expected = sha1_hex(&path).await.unwrap();

        std::fs::write(&path, b"hello worle").unwrap();
        assert!(!matches(&path, &expected).await);
    }

    #[tokio::test]
    async fn missing_file_is_a_mismatch() {
        let dir = TempDir::new().unwrap();
        assert!(!matches(&dir.path().join("gone.zip"), "abc").await);
    }
}
