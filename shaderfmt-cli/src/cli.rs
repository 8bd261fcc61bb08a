//! Command-line definitions.

use clap::{Parser, Subcommand};
use shaderfmt_core::UpdateStrategy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding downloaded formatter binaries
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Settings database path
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check for updates, then format shader files whenever they are saved
    Watch {
        /// Files or directories to watch
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Formatter binary to use instead of the downloaded one
        #[arg(long)]
        executable: Option<PathBuf>,

        /// Skip the update check
        #[arg(long)]
        offline: bool,

        /// Debounce delay for file events in milliseconds
        #[arg(long, default_value_t = 300)]
        debounce_ms: u64,
    },

    /// Format the given files once
    Format {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Formatter binary to use instead of the downloaded one
        #[arg(long)]
        executable: Option<PathBuf>,
    },

    /// Download the latest formatter if needed and print its path
    Update,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the current settings
    Show,

    /// Forget every stored setting
    Reset,

    /// Set the formatter binary override (empty string clears it)
    SetExecutable { path: String },

    /// Report when the update check finds nothing new
    ShowLatestVersionMessage {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// How an update replaces the cached binary
    UpdateStrategy { strategy: UpdateStrategy },

    /// Run the update check when watching starts
    CheckForUpdates {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch_defaults() {
        let cli = Cli::try_parse_from(["shaderfmt", "watch"]).unwrap();
        match cli.command {
            Commands::Watch {
                paths,
                executable,
                offline,
                debounce_ms,
            } => {
                assert_eq!(paths, vec![PathBuf::from(".")]);
                assert!(executable.is_none());
                assert!(!offline);
                assert_eq!(debounce_ms, 300);
            }
            _ => panic!("expected watch"),
        }
    }

    #[test]
    fn test_parse_config_update_strategy() {
        let cli = Cli::try_parse_from([
            "shaderfmt",
            "--db",
            "/tmp/s.db",
            "config",
            "update-strategy",
            "download-first",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/s.db")));
        match cli.command {
            Commands::Config {
                action: ConfigAction::UpdateStrategy { strategy },
            } => assert_eq!(strategy, UpdateStrategy::DownloadFirst),
            _ => panic!("expected config update-strategy"),
        }
    }

    #[test]
    fn test_parse_config_reset() {
        let cli = Cli::try_parse_from(["shaderfmt", "config", "reset"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Reset
            }
        ));
    }

    #[test]
    fn test_format_requires_files() {
        assert!(Cli::try_parse_from(["shaderfmt", "format"]).is_err());
    }
}
