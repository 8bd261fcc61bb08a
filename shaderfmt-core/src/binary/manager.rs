//! Activation-time update cycle.
//!
//! The `UpdateCoordinator` is the only writer of the binary cache. It runs once
//! per activation:
//!
//! ```text
//! CHECKING -> UP_TO_DATE    -> READY
//!          -> UPDATING      -> READY
//!          -> FRESH_INSTALL -> READY
//! ```
//!
//! A failed version check goes straight to READY with whatever is cached.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::CacheStore;
use super::downloader::HttpFetcher;
use super::installer::BinaryInstaller;
use super::release::{build_client, ReleaseEndpoint, ReleaseResolver, VersionSource};
use super::types::{CachedBinary, PlatformProfile, ReleaseVersion};
use crate::config::Settings;
use crate::notice::NoticeSender;

// ============================================================================
// Phases and Outcomes
// ============================================================================

/// States of the update cycle, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Checking,
    UpToDate,
    Updating,
    FreshInstall,
    Ready,
}

/// What the update cycle ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No check was made (disabled, or the release could not be resolved).
    Skipped,
    /// The cached version is the latest one.
    UpToDate(ReleaseVersion),
    /// A new binary was installed.
    Installed {
        from: Option<ReleaseVersion>,
        to: ReleaseVersion,
    },
    /// The download failed.
    InstallFailed { to: ReleaseVersion, error: String },
}

/// Result of one update cycle.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub outcome: UpdateOutcome,
    /// Phases entered, `Checking` first and `Ready` last.
    pub phases: Vec<UpdatePhase>,
    /// Binary to fall back on when no override is configured.
    pub binary: Option<CachedBinary>,
}

// ============================================================================
// Update Coordinator
// ============================================================================

/// Decides between install, update and no-op, and reports progress.
pub struct UpdateCoordinator {
    resolver: Arc<dyn VersionSource>,
    store: Arc<dyn CacheStore>,
    installer: BinaryInstaller,
    notices: NoticeSender,
}

impl UpdateCoordinator {
    pub fn new(
        resolver: Arc<dyn VersionSource>,
        store: Arc<dyn CacheStore>,
        installer: BinaryInstaller,
        notices: NoticeSender,
    ) -> Self {
        Self {
            resolver,
            store,
            installer,
            notices,
        }
    }

    /// Wires the HTTP resolver and fetcher against `endpoint`, sharing one client.
    pub fn with_http(
        store: Arc<dyn CacheStore>,
        endpoint: ReleaseEndpoint,
        platform: PlatformProfile,
        notices: NoticeSender,
    ) -> Result<Self, reqwest::Error> {
        let client = build_client()?;
        let resolver = Arc::new(ReleaseResolver::new(client.clone(), endpoint.clone()));
        let fetcher = Arc::new(HttpFetcher::new(client));
        let installer = BinaryInstaller::new(
            store.clone(),
            fetcher,
            endpoint,
            platform,
            notices.clone(),
        );
        Ok(Self::new(resolver, store, installer, notices))
    }

    /// Runs one update cycle with the given settings.
    pub async fn run(&self, settings: &Settings) -> UpdateReport {
        let mut phases = vec![UpdatePhase::Checking];

        if !settings.check_for_updates {
            debug!("Update check disabled");
            return self.ready(phases, UpdateOutcome::Skipped).await;
        }

        let latest = match self.resolver.latest_version().await {
            Ok(version) => version,
            Err(e) => {
                // Silent degrade: keep whatever is cached.
                warn!(error = %e, "Skipping update check");
                return self.ready(phases, UpdateOutcome::Skipped).await;
            }
        };

        let current = self
            .store
            .list_cached()
            .await
            .into_iter()
            .next()
            .map(|entry| entry.version);

        let outcome = match current {
            None => {
                phases.push(UpdatePhase::FreshInstall);
                info!(%latest, "No cached shader-formatter, installing");
                self.install(None, latest, settings).await
            }
            Some(current) if current != latest => {
                phases.push(UpdatePhase::Updating);
                info!(%current, %latest, "shader-formatter update found");
                self.notices.info(format!(
                    "Found shader formatter update from {} to {}",
                    current, latest
                ));
                self.install(Some(current), latest, settings).await
            }
            Some(current) => {
                phases.push(UpdatePhase::UpToDate);
                debug!(%current, "shader-formatter is up to date");
                if settings.show_latest_version_message {
                    self.notices.info(format!(
                        "You are using the latest shader-formatter v{} - no updates found.",
                        current
                    ));
                }
                UpdateOutcome::UpToDate(current)
            }
        };

        self.ready(phases, outcome).await
    }

    async fn install(
        &self,
        from: Option<ReleaseVersion>,
        to: ReleaseVersion,
        settings: &Settings,
    ) -> UpdateOutcome {
        self.notices
            .info(format!("Downloading shader-formatter v{}...", to));

        match self.installer.install(&to, settings.update_strategy).await {
            Ok(_) => {
                self.notices
                    .info(format!("shader-formatter v{} is downloaded", to));
                UpdateOutcome::Installed { from, to }
            }
            Err(e) => {
                warn!(error = %e, "shader-formatter install failed");
                self.notices.error(e.to_string());
                UpdateOutcome::InstallFailed {
                    to,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn ready(&self, mut phases: Vec<UpdatePhase>, outcome: UpdateOutcome) -> UpdateReport {
        phases.push(UpdatePhase::Ready);
        let binary = self.store.list_cached().await.into_iter().next();

        match &binary {
            Some(binary) => {
                debug!(version = %binary.version, path = %binary.path.display(), "Update cycle ready")
            }
            None => warn!("Update cycle ready without a cached shader-formatter"),
        }

        UpdateReport {
            outcome,
            phases,
            binary,
        }
    }
}
