//! Cache path management for the formatter binary.
//!
//! Binaries live directly in the cache root, one file per version:
//!
//! - Linux: `~/.cache/shader-formatter/bin/shader-formatter-version-1.4.2`
//! - macOS: `~/Library/Caches/shader-formatter/bin/shader-formatter-version-1.4.2`
//! - Windows: `%LOCALAPPDATA%\shader-formatter\bin\shader-formatter-version-1.4.2.exe`
//!
//! The version marker in the file name is what lets two versions coexist on
//! disk while a swap is in progress, and it is also how a listing recovers the
//! version of each entry.

use std::path::{Path, PathBuf};

use super::types::{PlatformProfile, ReleaseVersion};

/// Name of the released binary (also the download asset name).
pub const BINARY_NAME: &str = "shader-formatter";

/// Separates the binary name from the version in cache file names.
pub const VERSION_MARKER: &str = "-version-";

/// Suffix of a download that has not been committed yet.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Subdirectory name under the OS cache folder.
const CACHE_DIR_NAME: &str = "shader-formatter";

// ============================================================================
// Path Resolution
// ============================================================================

/// Returns the default cache root for downloaded binaries.
///
/// Falls back to the OS temp directory when no cache directory is known.
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
        .join("bin")
}

/// File name for a cached version: `shader-formatter-version-<version><suffix>`.
pub fn binary_file_name(version: &ReleaseVersion, platform: PlatformProfile) -> String {
    format!(
        "{}{}{}{}",
        BINARY_NAME, VERSION_MARKER, version, platform.executable_suffix
    )
}

/// Recovers the version from a cache file name.
///
/// Returns `None` for anything that is not a committed cache entry, including
/// in-flight `.part` downloads.
pub fn parse_binary_file_name(name: &str, platform: PlatformProfile) -> Option<ReleaseVersion> {
    if name.ends_with(PARTIAL_SUFFIX) {
        return None;
    }

    let rest = name
        .strip_prefix(BINARY_NAME)?
        .strip_prefix(VERSION_MARKER)?
        .strip_suffix(platform.executable_suffix)?;

    if rest.is_empty() {
        return None;
    }

    Some(ReleaseVersion::from_normalized(rest))
}

/// Path a download is streamed to before it is renamed over `target`.
pub fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
