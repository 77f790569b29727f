//! factup CLI entry point.

use clap::Parser;
use colored::Colorize;

use factup::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        eprintln!("{} {e:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
