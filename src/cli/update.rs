//! The `update` command: resolve, download, prune, persist.

use anyhow::{Result, anyhow};
use clap::Args;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::cli::InstallationArgs;
use crate::models::{self, ModStatus};
use crate::updater::Updater;

/// Update installed mods and their dependencies.
#[derive(Debug, Clone, Args)]
pub struct UpdateCommand {
    #[command(flatten)]
    pub install: InstallationArgs,

    /// Disable progress bars and spinners
    #[arg(long)]
    pub no_progress: bool,
}

impl UpdateCommand {
    pub async fn execute(self, quiet: bool) -> Result<()> {
        let show_progress = !self.no_progress && !quiet;
        let mut updater = Updater::open(self.install.into_options()?).await?;

        let spinner = show_progress.then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message("Resolving mod metadata...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });
        let resolve = updater.resolve_metadata().await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        for err in &resolve.errors {
            eprintln!("{} {err:#}", "warning:".yellow().bold());
        }
        for state in updater.mods().values() {
            if state.deprecated {
                eprintln!(
                    "{} {} is deprecated on the mod portal",
                    "warning:".yellow().bold(),
                    state.title.cyan()
                );
            }
        }

        if !models::updates_available(updater.mods()) {
            // Still an error if an enabled mod could not be resolved at all.
            let missing_release = updater
                .mods()
                .values()
                .any(|m| m.enabled && m.latest.is_none());
            if missing_release {
                return Err(anyhow!("some mods could not be resolved"));
            }
            if !quiet {
                println!("{}", "All mods are up to date.".green());
            }
            return Ok(());
        }

        if !quiet {
            let pending: Vec<_> = updater
                .mods()
                .values()
                .filter(|m| m.needs_update())
                .collect();
            println!("Found {} update(s):", pending.len());
            for state in pending {
                let latest = state
                    .latest
                    .as_ref()
                    .map(|r| r.version.as_str())
                    .unwrap_or("?");
                match &state.version {
                    Some(installed) => println!(
                        "  {} {} -> {}",
                        state.title.cyan(),
                        installed.yellow(),
                        latest.green()
                    ),
                    None => println!("  {} {}", state.title.cyan(), latest.green()),
                }
            }
        }

        let progress = show_progress.then(MultiProgress::new);
        let report = updater.update_mods(progress.as_ref()).await;

        for err in &report.errors {
            eprintln!("{} {err:#}", "error:".red().bold());
        }
        if !quiet && report.updated > 0 {
            println!("{}", format!("Updated {} mod(s)", report.updated).green());
        }

        if report.errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{} mod(s) failed to update", report.errors.len()))
        }
    }
}

// Status coloring shared with `list`.
pub(crate) fn status_label(status: ModStatus) -> colored::ColoredString {
    match status {
        ModStatus::Current => "up to date".green(),
        ModStatus::Outdated => "update available".yellow(),
        ModStatus::Missing => "missing".red(),
        ModStatus::Disabled => "disabled".dimmed(),
    }
}
