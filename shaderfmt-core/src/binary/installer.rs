//! Installs a formatter version into the cache.
//!
//! The payload is streamed to `<target>.part` and renamed over the target only
//! once the body is complete, so a listing never sees a half-written binary.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::CacheStore;
use super::downloader::{DownloadProgress, PayloadFetcher};
use super::paths;
use super::release::ReleaseEndpoint;
use super::types::{CachedBinary, PlatformProfile, ReleaseVersion};
use crate::config::UpdateStrategy;
use crate::error::ShaderFmtError;
use crate::notice::NoticeSender;

/// Permission bits given to a downloaded binary: rwxrwxr-x.
pub const EXECUTABLE_MODE: u32 = 0o775;

/// Marks an installed file as runnable.
pub type PermissionStep = fn(&Path) -> Result<(), ShaderFmtError>;

/// Downloads a version into the cache, replacing what was there.
pub struct BinaryInstaller {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn PayloadFetcher>,
    endpoint: ReleaseEndpoint,
    platform: PlatformProfile,
    notices: NoticeSender,
    permission_step: PermissionStep,
}

impl BinaryInstaller {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn PayloadFetcher>,
        endpoint: ReleaseEndpoint,
        platform: PlatformProfile,
        notices: NoticeSender,
    ) -> Self {
        Self {
            store,
            fetcher,
            endpoint,
            platform,
            notices,
            permission_step: make_executable,
        }
    }

    #[cfg(test)]
    fn with_permission_step(mut self, step: PermissionStep) -> Self {
        self.permission_step = step;
        self
    }

    /// Installs `version`.
    ///
    /// With [`UpdateStrategy::ReplaceFirst`] the cache is cleared before the
    /// fetch, so a failed download leaves no binary at all. With
    /// [`UpdateStrategy::DownloadFirst`] previous entries are dropped only
    /// after the new payload is committed.
    ///
    /// A failure to set the execute bit is reported as an error notice but
    /// does not fail the install.
    pub async fn install(
        &self,
        version: &ReleaseVersion,
        strategy: UpdateStrategy,
    ) -> Result<CachedBinary, ShaderFmtError> {
        let previous = match strategy {
            UpdateStrategy::ReplaceFirst => {
                self.store.clear_all().await;
                Vec::new()
            }
            UpdateStrategy::DownloadFirst => self.store.list_cached().await,
        };

        let url = self
            .endpoint
            .download_url(self.platform)
            .map_err(|e| ShaderFmtError::download(version.as_str(), e))?;
        let target = self.store.locate(version);
        let partial = paths::partial_path(&target);

        info!(%version, url = %url, target = %target.display(), ?strategy, "Installing shader-formatter");

        let progress = |p: DownloadProgress| {
            if let Some(percent) = p.percent {
                debug!("shader-formatter download progress: {:.1}%", percent);
            }
        };

        if let Err(e) = self.fetcher.fetch(&url, &partial, &progress).await {
            discard(&partial).await;
            return Err(ShaderFmtError::download(version.as_str(), format!("{:#}", e)));
        }

        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            discard(&partial).await;
            return Err(ShaderFmtError::download(
                version.as_str(),
                format!("failed to move download into {}: {}", target.display(), e),
            ));
        }

        for entry in previous.iter().filter(|entry| entry.path != target) {
            self.store.remove(entry).await;
        }

        let executable = if self.platform.needs_execute_bit {
            match (self.permission_step)(&target) {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "Installed binary may not be runnable");
                    self.notices.error(e.to_string());
                    false
                }
            }
        } else {
            true
        };

        info!(%version, path = %target.display(), "shader-formatter installed");

        Ok(CachedBinary {
            version: version.clone(),
            path: target,
            executable,
        })
    }
}

/// Sets rwxrwxr-x on `path`. No-op where there is no execute bit.
pub fn make_executable(path: &Path) -> Result<(), ShaderFmtError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE)).map_err(
            |source| ShaderFmtError::Permission {
                path: path.to_path_buf(),
                source,
            },
        )?;

        debug!("Set executable permission on {}", path.display());
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

async fn discard(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %partial.display(), error = %e, "Failed to remove partial download");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::cache::DirCacheStore;
    use crate::binary::testing::{CallLog, FakeFetcher, RecordingStore};
    use crate::notice::{drain, notice_channel};
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        log: CallLog,
        store: Arc<RecordingStore>,
        fetcher: Arc<FakeFetcher>,
    }

    fn fixture(platform: PlatformProfile) -> Fixture {
        let temp = TempDir::new().unwrap();
        let log = CallLog::default();
        let store = Arc::new(RecordingStore::new(
            DirCacheStore::new(temp.path().to_path_buf(), platform),
            log.clone(),
        ));
        let fetcher = Arc::new(FakeFetcher::new(log.clone()));
        Fixture {
            _temp: temp,
            log,
            store,
            fetcher,
        }
    }

    fn installer(fx: &Fixture, platform: PlatformProfile) -> (BinaryInstaller, crate::notice::NoticeReceiver) {
        let (tx, rx) = notice_channel();
        let installer = BinaryInstaller::new(
            fx.store.clone(),
            fx.fetcher.clone(),
            ReleaseEndpoint::default(),
            platform,
            tx,
        );
        (installer, rx)
    }

    #[tokio::test]
    async fn test_install_replace_first_clears_then_fetches() {
        let fx = fixture(PlatformProfile::unix());
        let (installer, _rx) = installer(&fx, PlatformProfile::unix());
        fx.store.seed("1.0.0").await;

        let installed = installer
            .install(&ReleaseVersion::new("1.1.0"), UpdateStrategy::ReplaceFirst)
            .await
            .unwrap();

        assert_eq!(
            fx.log.calls(),
            vec!["clear_all".to_string(), "fetch 1.1.0".to_string()]
        );
        assert_eq!(installed.version.as_str(), "1.1.0");
        assert!(installed.executable);

        let cached = fx.store.list_cached().await;
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].version.as_str(), "1.1.0");
    }

    #[tokio::test]
    async fn test_install_download_first_keeps_old_until_fetched() {
        let fx = fixture(PlatformProfile::unix());
        let (installer, _rx) = installer(&fx, PlatformProfile::unix());
        fx.store.seed("1.0.0").await;

        installer
            .install(&ReleaseVersion::new("1.1.0"), UpdateStrategy::DownloadFirst)
            .await
            .unwrap();

        let calls = fx.log.calls();
        assert_eq!(calls[0], "fetch 1.1.0");
        assert_eq!(calls[1], "remove 1.0.0");
        assert!(!calls.contains(&"clear_all".to_string()));

        let cached = fx.store.list_cached().await;
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].version.as_str(), "1.1.0");
    }

    #[tokio::test]
    async fn test_failed_download_replace_first_leaves_nothing() {
        let fx = fixture(PlatformProfile::unix());
        let (installer, _rx) = installer(&fx, PlatformProfile::unix());
        fx.store.seed("1.0.0").await;
        fx.fetcher.fail_with("connection reset");

        let err = installer
            .install(&ReleaseVersion::new("1.1.0"), UpdateStrategy::ReplaceFirst)
            .await
            .unwrap_err();

        assert!(matches!(err, ShaderFmtError::Download { .. }));
        assert!(err.to_string().contains("connection reset"));
        assert!(fx.store.list_cached().await.is_empty());
        assert!(!paths::partial_path(&fx.store.locate(&ReleaseVersion::new("1.1.0"))).exists());
    }

    #[tokio::test]
    async fn test_failed_download_download_first_keeps_previous() {
        let fx = fixture(PlatformProfile::unix());
        let (installer, _rx) = installer(&fx, PlatformProfile::unix());
        fx.store.seed("1.0.0").await;
        fx.fetcher.fail_with("connection reset");

        installer
            .install(&ReleaseVersion::new("1.1.0"), UpdateStrategy::DownloadFirst)
            .await
            .unwrap_err();

        let cached = fx.store.list_cached().await;
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].version.as_str(), "1.0.0");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unix_install_sets_mode_and_plain_url() {
        use std::os::unix::fs::PermissionsExt;

        let fx = fixture(PlatformProfile::unix());
        let (installer, mut rx) = installer(&fx, PlatformProfile::unix());

        let installed = installer
            .install(&ReleaseVersion::new("2.0.0"), UpdateStrategy::ReplaceFirst)
            .await
            .unwrap();

        let mode = std::fs::metadata(&installed.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, EXECUTABLE_MODE);
        assert!(installed
            .path
            .to_string_lossy()
            .ends_with("shader-formatter-version-2.0.0"));
        assert!(fx.fetcher.urls()[0].ends_with("/download/shader-formatter"));
        assert!(drain(&mut rx).is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_windows_install_appends_suffix_and_skips_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let fx = fixture(PlatformProfile::windows());
        let (installer, _rx) = installer(&fx, PlatformProfile::windows());

        let installed = installer
            .install(&ReleaseVersion::new("2.0.0"), UpdateStrategy::ReplaceFirst)
            .await
            .unwrap();

        assert!(installed
            .path
            .to_string_lossy()
            .ends_with("shader-formatter-version-2.0.0.exe"));
        assert!(fx.fetcher.urls()[0].ends_with("/download/shader-formatter.exe"));

        let mode = std::fs::metadata(&installed.path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0, "no permission step on Windows profile");
        assert!(installed.executable);
    }

    fn refuse_permissions(path: &Path) -> Result<(), ShaderFmtError> {
        Err(ShaderFmtError::Permission {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        })
    }

    #[tokio::test]
    async fn test_permission_failure_is_not_fatal() {
        let fx = fixture(PlatformProfile::unix());
        let (installer, mut rx) = installer(&fx, PlatformProfile::unix());
        let installer = installer.with_permission_step(refuse_permissions);

        let installed = installer
            .install(&ReleaseVersion::new("1.2.0"), UpdateStrategy::ReplaceFirst)
            .await
            .unwrap();

        assert!(!installed.executable);
        assert!(installed.path.exists());

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert_eq!(
            notices[0].message,
            format!(
                "failed to add 'execute' permission to file {}",
                installed.path.display()
            )
        );
    }

    #[tokio::test]
    async fn test_windows_profile_skips_permission_step() {
        let fx = fixture(PlatformProfile::windows());
        let (installer, mut rx) = installer(&fx, PlatformProfile::windows());
        let installer = installer.with_permission_step(refuse_permissions);

        let installed = installer
            .install(&ReleaseVersion::new("1.2.0"), UpdateStrategy::ReplaceFirst)
            .await
            .unwrap();

        assert!(installed.executable);
        assert!(drain(&mut rx).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_make_executable_missing_file_is_permission_error() {
        let temp = TempDir::new().unwrap();
        let err = make_executable(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, ShaderFmtError::Permission { .. }));
        assert!(err.to_string().starts_with("failed to add 'execute' permission"));
    }
}
