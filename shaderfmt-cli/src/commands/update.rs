//! One-shot update cycle.

use anyhow::Result;
use shaderfmt_core::UpdateOutcome;

use crate::cli::Cli;
use crate::host::Host;

pub async fn run(cli: &Cli) -> Result<i32> {
    let host = Host::new(cli, None)?;

    // An explicit update always checks, whatever the watch setting says.
    let mut settings = host.settings();
    settings.check_for_updates = true;

    let report = host.update(&settings).await?;
    host.finish().await;

    if let UpdateOutcome::Skipped = report.outcome {
        eprintln!("Could not reach the release page; using the cached binary");
    }

    match report.binary {
        Some(binary) => {
            println!("{}", binary.path.display());
            Ok(0)
        }
        None => {
            eprintln!("No shader-formatter binary is available");
            Ok(1)
        }
    }
}
