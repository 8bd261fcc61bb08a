//! One-shot formatting of explicit files.

use anyhow::{Context, Result};
use shaderfmt_core::{SaveOutcome, SavedDocument};
use std::path::PathBuf;
use tracing::warn;

use crate::cli::Cli;
use crate::host::Host;

/// Formats every file once. Exit code 1 if any run did not succeed.
pub async fn run(cli: &Cli, files: &[PathBuf], executable: Option<PathBuf>) -> Result<i32> {
    let host = Host::new(cli, executable)?;
    let router = host.router();

    let mut pending = Vec::new();
    for file in files {
        let path = std::path::absolute(file)
            .with_context(|| format!("Failed to resolve {}", file.display()))?;

        match router.on_save(SavedDocument::from_path(&path)) {
            Some(handle) => pending.push((path, handle)),
            None => warn!(file = %path.display(), "Not a shader file, skipped"),
        }
    }
    drop(router);

    let mut failed = false;
    for (path, handle) in pending {
        match handle.await {
            Ok(SaveOutcome::Formatted(result)) if result.succeeded => {}
            Ok(_) => failed = true,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Format task failed");
                failed = true;
            }
        }
    }

    host.finish().await;
    Ok(if failed { 1 } else { 0 })
}
