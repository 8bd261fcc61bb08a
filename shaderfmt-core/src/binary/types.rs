//! Core types for the formatter binary lifecycle.
//!
//! This module defines the foundational types shared by the resolver, the
//! cache store and the installer: release versions, cached binary entries and
//! the platform profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Release Version
// ============================================================================

/// A release identifier such as `1.4.2`.
///
/// Always held in normalized form: a single leading non-digit tag character
/// (`v1.4.2`) is stripped when a raw tag is converted, so two versions compare
/// equal iff their normalized strings are equal. Serialized values are already
/// normalized and are taken as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Normalizes a raw tag into a version.
    pub fn new(raw: &str) -> Self {
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) if !first.is_ascii_digit() => Self(chars.as_str().to_string()),
            _ => Self(raw.to_string()),
        }
    }

    /// Wraps a value that is already normalized, such as the version part of
    /// a cache file name.
    pub(crate) fn from_normalized(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReleaseVersion {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ReleaseVersion {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<ReleaseVersion> for String {
    fn from(version: ReleaseVersion) -> Self {
        version.0
    }
}

// ============================================================================
// Cached Binary
// ============================================================================

/// The locally cached formatter binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBinary {
    /// Version the binary was downloaded as.
    pub version: ReleaseVersion,
    /// Absolute path of the binary.
    pub path: PathBuf,
    /// Whether the file carries an execute bit (always true where no such
    /// bit exists).
    pub executable: bool,
}

// ============================================================================
// Platform Profile
// ============================================================================

/// Platform-dependent behavior, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    /// Suffix appended to the download URL and to cache file names.
    pub executable_suffix: &'static str,
    /// Whether a downloaded binary needs its permission bits set.
    pub needs_execute_bit: bool,
}

impl PlatformProfile {
    /// Profile for Windows targets.
    pub const fn windows() -> Self {
        Self {
            executable_suffix: ".exe",
            needs_execute_bit: false,
        }
    }

    /// Profile for every non-Windows target.
    pub const fn unix() -> Self {
        Self {
            executable_suffix: "",
            needs_execute_bit: true,
        }
    }

    /// Detects the profile of the running target.
    pub const fn current() -> Self {
        #[cfg(windows)]
        {
            Self::windows()
        }
        #[cfg(not(windows))]
        {
            Self::unix()
        }
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::current()
    }
}
