//! Command-line interface for factup.
//!
//! Two commands share the same session plumbing:
//! - `update` (the default when no subcommand is given) resolves metadata,
//!   downloads what is out of date, prunes superseded artifacts, and
//!   rewrites mod-list.json
//! - `list` resolves metadata and prints the tracked mods with their
//!   installed and latest versions, without touching anything on disk
//!
//! Each command is a module with its own argument struct and `execute`
//! method; the shared installation/credential flags live in
//! [`InstallationArgs`].

mod list;
mod update;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::CredentialSources;
use crate::constants::DEFAULT_PORTAL_URL;
use crate::core::FactupError;
use crate::updater::UpdaterOptions;

pub use list::ListCommand;
pub use update::UpdateCommand;

/// Keep Factorio mods up to date from the command line.
#[derive(Parser)]
#[command(
    name = "factup",
    about = "Update Factorio mods from the official Mod Portal",
    version,
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments for the default `update` invocation.
    #[command(flatten)]
    update: UpdateCommand,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Update installed mods and their dependencies (the default)
    Update(UpdateCommand),
    /// Show tracked mods with installed and latest versions
    List(ListCommand),
}

impl Cli {
    /// Initialize logging and dispatch to the selected command.
    pub async fn execute(self) -> Result<()> {
        init_logging(self.verbose, self.quiet);

        match self.command {
            Some(Commands::Update(cmd)) => cmd.execute(self.quiet).await,
            Some(Commands::List(cmd)) => cmd.execute().await,
            None => self.update.execute(self.quiet).await,
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "factup=debug"
    } else if quiet {
        "factup=error"
    } else {
        "factup=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Flags locating the Factorio installation and portal credentials.
///
/// Every path can be given explicitly; otherwise it is derived from the
/// positional installation directory the way a default server layout is
/// arranged (`bin/x64/factorio`, `mods/`).
#[derive(Debug, Clone, Args)]
pub struct InstallationArgs {
    /// Factorio installation directory
    #[arg(value_name = "ROOT_DIR")]
    pub root_dir: Option<PathBuf>,

    /// Mod portal username (overrides configuration files)
    #[arg(short = 'u', long)]
    pub username: Option<String>,

    /// Mod portal token (overrides configuration files)
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// Path to server-settings.json
    #[arg(short = 's', long, value_name = "FILE")]
    pub server_settings: Option<PathBuf>,

    /// Path to player-data.json
    #[arg(short = 'd', long, value_name = "FILE")]
    pub player_data: Option<PathBuf>,

    /// Path to the mods directory
    #[arg(short = 'm', long, value_name = "DIR")]
    pub mod_path: Option<PathBuf>,

    /// Path to the factorio binary
    #[arg(short = 'b', long, value_name = "FILE")]
    pub bin_path: Option<PathBuf>,

    /// Base URL of the mod portal
    #[arg(long, env = "FACTUP_PORTAL_URL", default_value = DEFAULT_PORTAL_URL, hide = true)]
    pub portal_url: String,
}

impl InstallationArgs {
    /// Turn the flags into concrete session options.
    ///
    /// The mods directory and binary fall back to the conventional layout
    /// under `ROOT_DIR`; missing both the flag and the root is a fatal
    /// configuration error.
    pub fn into_options(self) -> Result<UpdaterOptions> {
        let mod_dir = match (self.mod_path, &self.root_dir) {
            (Some(path), _) => path,
            (None, Some(root)) => root.join("mods"),
            (None, None) => {
                return Err(FactupError::config(
                    "no mods directory: pass an installation directory or --mod-path",
                )
                .into());
            }
        };

        let binary = match (self.bin_path, &self.root_dir) {
            (Some(path), _) => path,
            (None, Some(root)) => root
                .join("bin")
                .join("x64")
                .join(factorio_binary_name()),
            (None, None) => {
                return Err(FactupError::config(
                    "no factorio binary: pass an installation directory or --bin-path",
                )
                .into());
            }
        };

        let mut options = UpdaterOptions::new(mod_dir, binary, self.portal_url);
        options.credentials = CredentialSources {
            username: self.username,
            token: self.token,
            settings_path: self.server_settings,
            data_path: self.player_data,
        };
        Ok(options)
    }
}

fn factorio_binary_name() -> &'static str {
    if cfg!(windows) { "factorio.exe" } else { "factorio" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn bare_invocation_defaults_to_update() {
        let cli = parse(&["factup", "/opt/factorio"]);
        assert!(cli.command.is_none());
        assert_eq!(
            cli.update.install.root_dir.as_deref(),
            Some(std::path::Path::new("/opt/factorio"))
        );
    }

    #[test]
    fn list_subcommand_takes_its_own_root() {
        let cli = parse(&["factup", "list", "/opt/factorio"]);
        match cli.command {
            Some(Commands::List(cmd)) => {
                assert_eq!(
                    cmd.install.root_dir.as_deref(),
                    Some(std::path::Path::new("/opt/factorio"))
                );
            }
            _ => panic!("expected list subcommand"),
        }
    }

    #[test]
    fn explicit_paths_override_root_layout() {
        let cli = parse(&[
            "factup",
            "-m",
            "/srv/mods",
            "-b",
            "/usr/bin/factorio",
            "-u",
            "user",
            "-t",
            "tok",
        ]);
        let options = cli.update.install.into_options().unwrap();
        assert_eq!(options.mod_dir, PathBuf::from("/srv/mods"));
        assert_eq!(options.binary, PathBuf::from("/usr/bin/factorio"));
        assert_eq!(options.credentials.username.as_deref(), Some("user"));
    }

    #[test]
    fn root_layout_is_derived() {
        let cli = parse(&["factup", "/opt/factorio"]);
        let options = cli.update.install.into_options().unwrap();
        assert_eq!(options.mod_dir, PathBuf::from("/opt/factorio/mods"));
        assert!(
            options
                .binary
                .starts_with("/opt/factorio/bin/x64")
        );
    }

    #[test]
    fn no_paths_at_all_is_an_error() {
        let cli = parse(&["factup"]);
        assert!(cli.update.install.into_options().is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["factup", "-v", "-q", "/opt/factorio"]).is_err());
    }
}
