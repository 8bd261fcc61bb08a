//! Local cache of downloaded formatter binaries.
//!
//! The store is list-shaped so that a backend may keep several entries, but
//! the update cycle only ever leaves one behind. Only the update cycle writes
//! to it; save handling only reads.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::paths::{self, PARTIAL_SUFFIX};
use super::types::{CachedBinary, PlatformProfile, ReleaseVersion};

/// Storage for cached binaries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Lists every committed entry.
    async fn list_cached(&self) -> Vec<CachedBinary>;

    /// Removes every entry. Best effort: failures are logged, never returned.
    async fn clear_all(&self);

    /// Removes a single entry, best effort.
    async fn remove(&self, entry: &CachedBinary);

    /// Path an entry for `version` lives at (lookup and install target).
    fn locate(&self, version: &ReleaseVersion) -> PathBuf;
}

// ============================================================================
// Directory Store
// ============================================================================

/// Keeps binaries as plain files in one directory.
#[derive(Debug, Clone)]
pub struct DirCacheStore {
    root: PathBuf,
    platform: PlatformProfile,
}

impl DirCacheStore {
    pub fn new(root: PathBuf, platform: PlatformProfile) -> Self {
        Self { root, platform }
    }

    /// Store rooted at the OS cache directory for the running platform.
    pub fn with_default_root() -> Self {
        Self::new(paths::get_cache_dir(), PlatformProfile::current())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn file_names(&self) -> Vec<String> {
        let mut names = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = %self.root.display(), error = %e, "Cache directory not readable");
                return names;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        names
    }

    async fn remove_path(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed cached file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cached file"),
        }
    }
}

#[async_trait]
impl CacheStore for DirCacheStore {
    async fn list_cached(&self) -> Vec<CachedBinary> {
        let mut cached = Vec::new();

        for name in self.file_names().await {
            let Some(version) = paths::parse_binary_file_name(&name, self.platform) else {
                continue;
            };

            let path = self.root.join(&name);
            if !path.is_file() {
                continue;
            }

            let executable = !self.platform.needs_execute_bit || has_execute_bit(&path);
            cached.push(CachedBinary {
                version,
                path,
                executable,
            });
        }

        cached
    }

    async fn clear_all(&self) {
        for name in self.file_names().await {
            let committed = paths::parse_binary_file_name(&name, self.platform).is_some();
            let stale_partial =
                name.starts_with(paths::BINARY_NAME) && name.ends_with(PARTIAL_SUFFIX);

            if committed || stale_partial {
                self.remove_path(&self.root.join(&name)).await;
            }
        }
    }

    async fn remove(&self, entry: &CachedBinary) {
        self.remove_path(&entry.path).await;
    }

    fn locate(&self, version: &ReleaseVersion) -> PathBuf {
        self.root
            .join(paths::binary_file_name(version, self.platform))
    }
}

#[cfg(unix)]
fn has_execute_bit(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn has_execute_bit(_path: &Path) -> bool {
    true
}
