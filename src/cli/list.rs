//! The `list` command: show tracked mods without changing anything.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::cli::InstallationArgs;
use crate::cli::update::status_label;
use crate::models::{self, ModStatus};
use crate::updater::Updater;

/// Show tracked mods with their installed and latest versions.
#[derive(Debug, Clone, Args)]
pub struct ListCommand {
    #[command(flatten)]
    pub install: InstallationArgs,
}

impl ListCommand {
    pub async fn execute(self) -> Result<()> {
        let mut updater = Updater::open(self.install.into_options()?).await?;
        let resolve = updater.resolve_metadata().await;
        for err in &resolve.errors {
            eprintln!("{} {err:#}", "warning:".yellow().bold());
        }

        let mods = updater.mods();
        if mods.is_empty() {
            println!("No mods tracked in mod-list.json.");
            return Ok(());
        }

        let rows: Vec<(String, String, String, ModStatus)> = models::sorted_by_title(mods)
            .into_iter()
            .map(|state| {
                let installed = state.version.clone().unwrap_or_else(|| "-".to_string());
                let latest = state
                    .latest
                    .as_ref()
                    .map(|r| r.version.clone())
                    .unwrap_or_else(|| "-".to_string());
                (state.title.clone(), installed, latest, state.status())
            })
            .collect();

        let (title_width, installed_width, latest_width) = column_widths(&rows);
        for (title, installed, latest, status) in &rows {
            // Pad before colorizing: ANSI escapes would break the column math.
            let title = format!("{title:<title_width$}");
            println!(
                "{}  {installed:>installed_width$}  {latest:>latest_width$}  {}",
                title.cyan(),
                status_label(*status)
            );
        }

        let count = |wanted: ModStatus| {
            mods.values().filter(|m| m.status() == wanted).count()
        };
        println!(
            "\n{} up to date, {} outdated, {} missing, {} disabled ({} total)",
            count(ModStatus::Current),
            count(ModStatus::Outdated),
            count(ModStatus::Missing),
            count(ModStatus::Disabled),
            mods.len()
        );
        Ok(())
    }
}

/// Column widths for the (title, installed, latest) table, each sized to
/// its widest cell.
fn column_widths(rows: &[(String, String, String, ModStatus)]) -> (usize, usize, usize) {
    let title = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
    let installed = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).max(9);
    let latest = rows.iter().map(|r| r.2.len()).max().unwrap_or(0).max(6);
    (title, installed, latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, installed: &str, latest: &str) -> (String, String, String, ModStatus) {
        (
            title.to_string(),
            installed.to_string(),
            latest.to_string(),
            ModStatus::Current,
        )
    }

    #[test]
    fn columns_grow_with_their_widest_cell() {
        let rows = vec![
            row("helmod", "2.2.12", "2.2.12"),
            row("Krastorio 2", "1.3.0", "2024.10.1234"),
        ];
        let (title, installed, latest) = column_widths(&rows);
        assert_eq!(title, "Krastorio 2".len());
        assert_eq!(installed, 9);
        assert_eq!(latest, "2024.10.1234".len());
    }

    #[test]
    fn empty_rows_fall_back_to_minimum_widths() {
        let (title, installed, latest) = column_widths(&[]);
        assert_eq!(title, 0);
        assert_eq!(installed, 9);
        assert_eq!(latest, 6);
    }
}
