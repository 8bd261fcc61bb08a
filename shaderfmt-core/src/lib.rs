//! shaderfmt Core Library
//!
//! This crate keeps the shader-formatter binary up to date and runs it when a
//! shader file is saved. It includes:
//!
//! - Release resolution and binary download into the OS cache directory
//! - The activation-time update cycle
//! - Save-event filtering and formatter invocation
//! - Configuration management backed by SQLite
//! - User-visible notices delivered over a channel

pub mod binary;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod notice;

// Re-exports for convenience
pub use config::{Settings, SettingsProvider, SettingsStore, UpdateStrategy};
pub use db::Database;
pub use error::ShaderFmtError;

// Re-export the binary lifecycle
pub use binary::{
    CacheStore, CachedBinary, DirCacheStore, PlatformProfile, ReleaseEndpoint, ReleaseVersion,
    UpdateCoordinator, UpdateOutcome, UpdatePhase, UpdateReport,
};

// Re-export save handling
pub use format::{FormatInvoker, FormatRequest, FormatResult, SaveEventRouter, SaveOutcome, SavedDocument};

// Re-export notices
pub use notice::{notice_channel, Notice, NoticeLevel, NoticeReceiver, NoticeSender};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
