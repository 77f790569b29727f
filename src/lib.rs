//! factup - keep a Factorio server's mods up to date.
//!
//! The library drives one update session end to end:
//!
//! 1. [`version::probe`] asks the game binary for its `major.minor` version
//! 2. [`manifest`] loads `mod-list.json` and scans the installed artifacts
//! 3. [`resolver`] fetches portal metadata in bounded-concurrency waves,
//!    selecting the latest compatible release per mod and pulling in
//!    required transitive dependencies until the set is closed
//! 4. [`installer`] downloads what is missing or outdated, verifies SHA-1
//!    digests, and prunes superseded artifact files
//! 5. [`manifest`] persists the final set back atomically, with a backup
//!
//! Fatal errors (bad configuration, unreadable manifest, failed version
//! probe) abort before anything is touched; per-mod metadata and download
//! failures are accumulated and reported without stopping the rest of the
//! batch. [`updater::Updater`] ties the phases together and is what the
//! CLI in [`cli`] drives.

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod installer;
pub mod manifest;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod updater;
pub mod version;

#[cfg(test)]
pub mod test_utils;
