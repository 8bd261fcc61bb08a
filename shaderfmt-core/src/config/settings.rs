//! Formatter settings.
//!
//! Settings are persisted to the SQLite database as JSON under the
//! `shader-formatter` key.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::db::Database;

/// Settings key (and namespace) in the database.
pub const SETTINGS_KEY: &str = "shader-formatter";

// =============================================================================
// Update Strategy
// =============================================================================

/// How an update swaps the cached binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateStrategy {
    /// Clear the cache, then download. A failed download leaves no binary
    /// until the next successful update.
    #[default]
    ReplaceFirst,
    /// Download next to the old binary and drop the old one afterwards.
    DownloadFirst,
}

impl std::fmt::Display for UpdateStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReplaceFirst => write!(f, "replace-first"),
            Self::DownloadFirst => write!(f, "download-first"),
        }
    }
}

impl std::str::FromStr for UpdateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "replace-first" => Ok(Self::ReplaceFirst),
            "download-first" => Ok(Self::DownloadFirst),
            _ => Err(format!("Unknown update strategy: {}", s)),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Formatter settings - persisted to database as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Absolute path of a formatter binary to use instead of the cached one.
    /// Empty means unset.
    pub executable: String,

    /// Report when the update check finds nothing new.
    pub show_latest_version_message: bool,

    /// Swap policy for updates.
    pub update_strategy: UpdateStrategy,

    /// Run the update check at activation.
    pub check_for_updates: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executable: String::new(),
            show_latest_version_message: false,
            update_strategy: UpdateStrategy::default(),
            check_for_updates: true,
        }
    }
}

impl Settings {
    /// Load settings from database, using defaults for missing values.
    ///
    /// If settings don't exist or can't be parsed, returns defaults.
    pub fn load(db: &Database) -> Self {
        let mut settings = Self::default();

        match db.get_setting(SETTINGS_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(loaded) => settings = loaded,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse settings, using defaults");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read settings, using defaults");
            }
        }

        settings
    }

    /// Save settings to database.
    pub fn save(&self, db: &Database) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        db.set_setting(SETTINGS_KEY, &json)?;
        Ok(())
    }

    /// Drops the stored settings so the next load yields defaults.
    pub fn reset(db: &Database) -> anyhow::Result<()> {
        db.delete_setting(SETTINGS_KEY)?;
        Ok(())
    }

    /// The override binary, if one is configured.
    pub fn executable_override(&self) -> Option<PathBuf> {
        let trimmed = self.executable.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}

// =============================================================================
// Settings Providers
// =============================================================================

/// Read-only view of the current settings.
pub trait SettingsProvider: Send + Sync {
    fn current(&self) -> Settings;
}

impl SettingsProvider for Settings {
    fn current(&self) -> Settings {
        self.clone()
    }
}

/// Reads settings from the database on every call, so edits made while the
/// process runs are picked up by the next save event.
pub struct SettingsStore {
    db: Mutex<Database>,
}

impl SettingsStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

impl SettingsProvider for SettingsStore {
    fn current(&self) -> Settings {
        match self.db.lock() {
            Ok(db) => Settings::load(&db),
            Err(_) => {
                tracing::warn!("Settings database lock poisoned, using defaults");
                Settings::default()
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
