//! End-to-end CLI tests.
//!
//! These run the real binary against a fake installation layout. The
//! portal URL points at an unroutable local port, so every network call
//! fails fast and deterministically; the tests assert on the offline
//! behavior (argument handling, probing, manifest handling, error
//! reporting) rather than on downloads.

use assert_cmd::Command;
use predicates::prelude::*;

const DEAD_PORTAL: &str = "http://127.0.0.1:9";

fn factup() -> Command {
    let mut cmd = Command::cargo_bin("factup").unwrap();
    cmd.env_remove("FACTUP_PORTAL_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands_and_flags() {
    factup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("--username"))
        .stdout(predicate::str::contains("--mod-path"));
}

#[test]
fn no_installation_arguments_is_an_error() {
    factup()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--mod-path"));
}

#[cfg(unix)]
mod with_layout {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A minimal server layout: bin/x64/factorio (a script that prints a
    /// version banner), mods/mod-list.json, server-settings.json.
    fn server_layout(version_banner: &str) -> (TempDir, PathBuf) {
        let root = TempDir::new().unwrap();
        let bin_dir = root.path().join("bin").join("x64");
        std::fs::create_dir_all(&bin_dir).unwrap();
        write_script(&bin_dir.join("factorio"), version_banner);

        let mod_dir = root.path().join("mods");
        std::fs::create_dir_all(&mod_dir).unwrap();
        std::fs::write(
            mod_dir.join("mod-list.json"),
            r#"{"mods":[
                {"name":"base","enabled":true},
                {"name":"helmod","enabled":true},
                {"name":"flib","enabled":false}
            ]}"#,
        )
        .unwrap();

        std::fs::write(
            root.path().join("server-settings.json"),
            r#"{"username":"tester","token":"secret"}"#,
        )
        .unwrap();

        let root_path = root.path().to_path_buf();
        (root, root_path)
    }

    fn write_script(path: &Path, banner: &str) {
        std::fs::write(path, format!("#!/bin/sh\necho \"{banner}\"\n")).unwrap();
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    #[test]
    fn update_reports_unreachable_portal_per_mod() {
        let (_root, path) = server_layout("Version: 2.0.28 (build 80571, linux64, headless)");
        factup()
            .arg(&path)
            .args(["--portal-url", DEAD_PORTAL, "--no-progress"])
            .assert()
            .failure()
            // Metadata for helmod and flib both fail; base is built in and
            // never queried.
            .stderr(predicate::str::contains("helmod"))
            .stderr(predicate::str::contains("flib"));
    }

    #[test]
    fn list_survives_portal_failures() {
        let (_root, path) = server_layout("Version: 2.0.28 (build 80571, linux64, headless)");
        factup()
            .args(["list"])
            .arg(&path)
            .args(["--portal-url", DEAD_PORTAL])
            .assert()
            .success()
            .stdout(predicate::str::contains("helmod"))
            .stdout(predicate::str::contains("missing"))
            .stdout(predicate::str::contains("disabled"))
            .stdout(predicate::str::contains("(2 total)"));
    }

    #[test]
    fn portal_url_can_come_from_the_environment() {
        let (_root, path) = server_layout("Version: 2.0.28 (build 80571, linux64, headless)");
        factup()
            .arg(&path)
            .arg("--no-progress")
            .env("FACTUP_PORTAL_URL", DEAD_PORTAL)
            .assert()
            .failure()
            .stderr(predicate::str::contains("helmod"));
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let (_root, path) = server_layout("Version: 2.0.28 (build 80571, linux64, headless)");
        std::fs::remove_file(path.join("mods").join("mod-list.json")).unwrap();
        factup()
            .arg(&path)
            .args(["--portal-url", DEAD_PORTAL])
            .assert()
            .failure()
            .stderr(predicate::str::contains("mod-list.json"));
    }

    #[test]
    fn unparsable_version_banner_is_fatal() {
        let (_root, path) = server_layout("not a version banner");
        factup()
            .arg(&path)
            .args(["--portal-url", DEAD_PORTAL])
            .assert()
            .failure()
            .stderr(predicate::str::contains("version"));
    }

    #[test]
    fn cli_credentials_override_missing_files() {
        let (_root, path) = server_layout("Version: 2.0.28 (build 80571, linux64, headless)");
        std::fs::remove_file(path.join("server-settings.json")).unwrap();
        // Without flags, credential resolution fails.
        factup()
            .arg(&path)
            .args(["--portal-url", DEAD_PORTAL])
            .assert()
            .failure()
            .stderr(predicate::str::contains("token"));
        // With flags, the run proceeds to the (unreachable) portal.
        factup()
            .arg(&path)
            .args(["-u", "user", "-t", "tok", "--portal-url", DEAD_PORTAL, "--no-progress"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("helmod"));
    }

    #[test]
    fn empty_mod_list_is_a_clean_noop() {
        let (_root, path) = server_layout("Version: 2.0.28 (build 80571, linux64, headless)");
        std::fs::write(
            path.join("mods").join("mod-list.json"),
            r#"{"mods":[{"name":"base","enabled":true}]}"#,
        )
        .unwrap();
        factup()
            .arg(&path)
            .args(["--portal-url", DEAD_PORTAL, "--no-progress"])
            .assert()
            .success()
            .stdout(predicate::str::contains("up to date"));
    }
}
