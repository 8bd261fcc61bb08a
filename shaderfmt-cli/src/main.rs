//! shaderfmt - format shader files on save
//!
//! Keeps the shader-formatter binary up to date and runs it whenever a watched
//! HLSL or GLSL file is written.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod host;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("shaderfmt={}", level).parse()?)
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting shaderfmt v{}", shaderfmt_core::VERSION);

    let exit_code = commands::run(cli).await?;

    std::process::exit(exit_code);
}
