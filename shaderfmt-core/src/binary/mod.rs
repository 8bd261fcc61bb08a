//! Lifecycle of the shader-formatter binary.
//!
//! The binary is downloaded on demand from the project's release page and kept
//! in the OS cache directory. One update cycle runs per activation; save
//! handling only reads what it leaves behind.
//!
//! # Architecture
//!
//! - `types`: Core types (ReleaseVersion, CachedBinary, PlatformProfile)
//! - `paths`: Cache directory and file naming
//! - `release`: Latest-release resolution via the redirect
//! - `downloader`: Streaming download with progress reporting
//! - `cache`: The on-disk binary store
//! - `installer`: Atomic install into the store
//! - `manager`: The activation-time update cycle
//!
//! # Example
//!
//! ```ignore
//! use shaderfmt_core::binary::{DirCacheStore, ReleaseEndpoint, UpdateCoordinator};
//!
//! let store = Arc::new(DirCacheStore::with_default_root());
//! let coordinator = UpdateCoordinator::with_http(
//!     store,
//!     ReleaseEndpoint::default(),
//!     PlatformProfile::current(),
//!     notices,
//! )?;
//!
//! let report = coordinator.run(&settings).await;
//! if let Some(binary) = report.binary {
//!     println!("Using {}", binary.path.display());
//! }
//! ```

pub mod cache;
pub mod downloader;
pub mod installer;
pub mod manager;
pub mod paths;
pub mod release;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use cache::{CacheStore, DirCacheStore};
pub use downloader::{DownloadProgress, HttpFetcher, PayloadFetcher};
pub use installer::{make_executable, BinaryInstaller, EXECUTABLE_MODE};
pub use manager::{UpdateCoordinator, UpdateOutcome, UpdatePhase, UpdateReport};
pub use paths::{binary_file_name, get_cache_dir, parse_binary_file_name, BINARY_NAME};
pub use release::{
    build_client, ReleaseEndpoint, ReleaseResolver, VersionSource, DEFAULT_LATEST_RELEASE_URL,
};
pub use types::{CachedBinary, PlatformProfile, ReleaseVersion};
