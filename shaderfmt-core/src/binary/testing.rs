//! In-memory fakes shared by the lifecycle and router tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use url::Url;

use super::cache::{CacheStore, DirCacheStore};
use super::downloader::{DownloadProgress, PayloadFetcher, ProgressFn};
use super::paths::{BINARY_NAME, PARTIAL_SUFFIX, VERSION_MARKER};
use super::release::VersionSource;
use super::types::{CachedBinary, ReleaseVersion};
use crate::error::ShaderFmtError;

/// Ordered record of side-effecting calls across fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

// ============================================================================
// Version Source
// ============================================================================

pub struct FakeVersionSource {
    latest: Mutex<Result<String, String>>,
}

impl FakeVersionSource {
    pub fn new(latest: &str) -> Self {
        Self {
            latest: Mutex::new(Ok(latest.to_string())),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            latest: Mutex::new(Err("connection refused".to_string())),
        }
    }

    pub fn set_latest(&self, latest: &str) {
        *self.latest.lock().unwrap() = Ok(latest.to_string());
    }
}

#[async_trait]
impl VersionSource for FakeVersionSource {
    async fn latest_version(&self) -> Result<ReleaseVersion, ShaderFmtError> {
        match &*self.latest.lock().unwrap() {
            Ok(raw) => Ok(ReleaseVersion::new(raw)),
            Err(reason) => Err(ShaderFmtError::Network(reason.clone())),
        }
    }
}

// ============================================================================
// Fetcher
// ============================================================================

/// Writes a small payload instead of downloading; logs `fetch <version>`.
pub struct FakeFetcher {
    log: CallLog,
    urls: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
}

impl FakeFetcher {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            urls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

fn version_from_dest(dest: &Path) -> String {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.trim_end_matches(PARTIAL_SUFFIX)
        .trim_end_matches(".exe")
        .trim_start_matches(BINARY_NAME)
        .trim_start_matches(VERSION_MARKER)
        .to_string()
}

#[async_trait]
impl PayloadFetcher for FakeFetcher {
    async fn fetch(&self, url: &Url, dest: &Path, progress: ProgressFn<'_>) -> anyhow::Result<u64> {
        self.log.push(format!("fetch {}", version_from_dest(dest)));
        self.urls.lock().unwrap().push(url.to_string());

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let failure = self.failure.lock().unwrap().clone();
        if let Some(reason) = failure {
            std::fs::write(dest, b"#!/bin")?;
            anyhow::bail!(reason);
        }

        let payload = b"#!/bin/sh\nexit 0\n";
        std::fs::write(dest, payload)?;
        progress(DownloadProgress::new(payload.len() as u64, Some(payload.len() as u64)));
        Ok(payload.len() as u64)
    }
}

// ============================================================================
// Store
// ============================================================================

/// A real directory store that logs `clear_all` and `remove <version>`.
pub struct RecordingStore {
    inner: DirCacheStore,
    log: CallLog,
}

impl RecordingStore {
    pub fn new(inner: DirCacheStore, log: CallLog) -> Self {
        Self { inner, log }
    }

    /// Places a committed entry for `version` without logging.
    pub async fn seed(&self, version: &str) -> PathBuf {
        let path = self.inner.locate(&ReleaseVersion::new(version));
        std::fs::create_dir_all(self.inner.root()).unwrap();
        std::fs::write(&path, b"old binary").unwrap();
        path
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn list_cached(&self) -> Vec<CachedBinary> {
        self.inner.list_cached().await
    }

    async fn clear_all(&self) {
        self.log.push("clear_all");
        self.inner.clear_all().await;
    }

    async fn remove(&self, entry: &CachedBinary) {
        self.log.push(format!("remove {}", entry.version));
        self.inner.remove(entry).await;
    }

    fn locate(&self, version: &ReleaseVersion) -> PathBuf {
        self.inner.locate(version)
    }
}
