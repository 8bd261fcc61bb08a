//! Settings inspection and editing.

use anyhow::{Context, Result};
use shaderfmt_core::{CacheStore, Database, Settings};

use crate::cli::{Cli, ConfigAction};
use crate::host::{cache_store, open_database};

pub async fn run(cli: &Cli, action: &ConfigAction) -> Result<i32> {
    let db = open_database(cli)?;
    let mut settings = Settings::load(&db);

    match action {
        ConfigAction::Show => {
            show(cli, &db, &settings).await?;
            return Ok(0);
        }
        ConfigAction::Reset => {
            Settings::reset(&db).context("Failed to reset settings")?;
            tracing::info!(db = %db.path().display(), "Settings reset to defaults");
            return Ok(0);
        }
        ConfigAction::SetExecutable { path } => settings.executable = path.trim().to_string(),
        ConfigAction::ShowLatestVersionMessage { enabled } => {
            settings.show_latest_version_message = *enabled
        }
        ConfigAction::UpdateStrategy { strategy } => settings.update_strategy = *strategy,
        ConfigAction::CheckForUpdates { enabled } => settings.check_for_updates = *enabled,
    }

    settings.save(&db).context("Failed to save settings")?;
    tracing::info!(db = %db.path().display(), "Settings saved");
    Ok(0)
}

async fn show(cli: &Cli, db: &Database, settings: &Settings) -> Result<()> {
    let store = cache_store(cli);

    println!("{}", serde_json::to_string_pretty(settings)?);
    println!("settings database: {}", db.path().display());
    println!("binary cache:      {}", store.root().display());

    match store.list_cached().await.first() {
        Some(binary) => println!(
            "cached binary:     v{} ({})",
            binary.version,
            binary.path.display()
        ),
        None => println!("cached binary:     none"),
    }
    Ok(())
}
