//! Command implementations.

mod config;
mod format;
mod update;
mod watch;

use anyhow::Result;

use crate::cli::{Cli, Commands};

/// Run the selected command and return the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    match &cli.command {
        Commands::Watch {
            paths,
            executable,
            offline,
            debounce_ms,
        } => watch::run(&cli, paths, executable.clone(), *offline, *debounce_ms).await,
        Commands::Format { files, executable } => {
            format::run(&cli, files, executable.clone()).await
        }
        Commands::Update => update::run(&cli).await,
        Commands::Config { action } => config::run(&cli, action).await,
    }
}
