//! Wiring shared by the commands: settings, cache, notices and the router.

use anyhow::{Context, Result};
use chrono::Local;
use shaderfmt_core::{
    notice_channel, CacheStore, Database, DirCacheStore, Notice, NoticeReceiver, NoticeSender,
    PlatformProfile, ReleaseEndpoint, SaveEventRouter, Settings, SettingsProvider, SettingsStore,
    UpdateCoordinator, UpdateReport,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cli::Cli;

/// Opens the settings database, honouring `--db`.
pub fn open_database(cli: &Cli) -> Result<Database> {
    let db = match &cli.db {
        Some(path) => Database::open_at(path.clone()),
        None => Database::open(),
    }
    .context("Failed to open settings database")?;

    db.migrate().context("Failed to migrate settings database")?;
    Ok(db)
}

/// Cache store rooted at `--cache-dir` or the OS cache directory.
pub fn cache_store(cli: &Cli) -> DirCacheStore {
    match &cli.cache_dir {
        Some(root) => DirCacheStore::new(root.clone(), PlatformProfile::current()),
        None => DirCacheStore::with_default_root(),
    }
}

/// Settings with a per-run executable override layered on top.
struct RunSettings {
    inner: SettingsStore,
    executable: Option<PathBuf>,
}

impl SettingsProvider for RunSettings {
    fn current(&self) -> Settings {
        let mut settings = self.inner.current();
        if let Some(path) = &self.executable {
            settings.executable = path.to_string_lossy().into_owned();
        }
        settings
    }
}

/// Everything a running command needs.
pub struct Host {
    settings: Arc<dyn SettingsProvider>,
    store: Arc<dyn CacheStore>,
    notices: NoticeSender,
    printer: JoinHandle<()>,
}

impl Host {
    pub fn new(cli: &Cli, executable: Option<PathBuf>) -> Result<Self> {
        let db = open_database(cli)?;
        let settings: Arc<dyn SettingsProvider> = Arc::new(RunSettings {
            inner: SettingsStore::new(db),
            executable,
        });
        let store: Arc<dyn CacheStore> = Arc::new(cache_store(cli));

        let (notices, rx) = notice_channel();
        let printer = tokio::spawn(print_notices(rx));

        Ok(Self {
            settings,
            store,
            notices,
            printer,
        })
    }

    pub fn settings(&self) -> Settings {
        self.settings.current()
    }

    /// Runs the activation-time update cycle.
    pub async fn update(&self, settings: &Settings) -> Result<UpdateReport> {
        let coordinator = UpdateCoordinator::with_http(
            self.store.clone(),
            ReleaseEndpoint::default(),
            PlatformProfile::current(),
            self.notices.clone(),
        )
        .context("Failed to build HTTP client")?;

        Ok(coordinator.run(settings).await)
    }

    pub fn router(&self) -> Arc<SaveEventRouter> {
        Arc::new(SaveEventRouter::new(
            self.settings.clone(),
            self.store.clone(),
            self.notices.clone(),
        ))
    }

    /// Waits until every queued notice is printed.
    ///
    /// Routers handed out by [`Host::router`] must be dropped first, since
    /// they keep the channel open.
    pub async fn finish(self) {
        drop(self.notices);
        if let Err(e) = self.printer.await {
            debug!(error = %e, "Notice printer stopped");
        }
    }
}

async fn print_notices(mut rx: NoticeReceiver) {
    while let Some(notice) = rx.recv().await {
        print_notice(&notice);
    }
}

fn print_notice(notice: &Notice) {
    let line = format_notice(notice);
    if notice.is_error() {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

fn format_notice(notice: &Notice) -> String {
    let at = notice.at.with_timezone(&Local).format("%H:%M:%S");
    if notice.is_error() {
        format!("[{}] error: {}", at, notice.message)
    } else {
        format!("[{}] {}", at, notice.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_notice_marks_errors() {
        let info = format_notice(&Notice::info("shader-formatter v1.0.0 is downloaded"));
        assert!(info.starts_with('['));
        assert!(info.ends_with("] shader-formatter v1.0.0 is downloaded"));

        let error = format_notice(&Notice::error("boom"));
        assert!(error.ends_with("] error: boom"));
    }
}
