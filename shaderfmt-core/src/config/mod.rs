//! Configuration module for shaderfmt.
//!
//! Manages formatter settings stored in SQLite.

mod settings;

pub use settings::{Settings, SettingsProvider, SettingsStore, UpdateStrategy, SETTINGS_KEY};
