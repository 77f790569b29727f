//! Global constants used throughout the factup codebase.
//!
//! Timeout durations, concurrency bounds and response-size caps live here
//! so the numbers stay discoverable instead of being scattered as magic
//! values through the networking and download code.

use std::time::Duration;

/// Base URL of the official Factorio Mod Portal.
pub const DEFAULT_PORTAL_URL: &str = "https://mods.factorio.com";

/// Timeout for establishing a TCP connection to the portal.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a single metadata request (`/api/mods/{name}/full`).
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for a full artifact download.
///
/// Downloads are much larger than metadata responses, so this is
/// deliberately generous. The timeout covers the entire streamed body,
/// not just the response headers.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Timeout for probing the local Factorio binary with `--version`.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Cap on metadata response bodies (10 MB).
///
/// Prevents memory exhaustion from malicious or malformed API responses.
/// Real portal responses for even the largest mods are well under this.
pub const MAX_METADATA_BYTES: usize = 10 * 1024 * 1024;

/// Default number of concurrent metadata fetches per discovery wave.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 10;

/// Default number of concurrent artifact downloads.
///
/// Lower than the metadata bound because downloads are far costlier for
/// both the portal and the local disk.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 5;
