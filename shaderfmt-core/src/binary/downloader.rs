//! Async payload downloader with progress reporting.
//!
//! Streams a response body straight to disk with reqwest, invoking a progress
//! callback after every chunk.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

// ============================================================================
// Download Progress
// ============================================================================

/// Progress information during a download.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub bytes_downloaded: u64,
    /// Total bytes expected (if known from Content-Length header).
    pub total_bytes: Option<u64>,
    /// Progress percentage (0.0 to 100.0), or None if total is unknown.
    pub percent: Option<f32>,
}

impl DownloadProgress {
    pub fn new(bytes_downloaded: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes.map(|total| {
            if total > 0 {
                (bytes_downloaded as f32 / total as f32) * 100.0
            } else {
                0.0
            }
        });

        Self {
            bytes_downloaded,
            total_bytes,
            percent,
        }
    }
}

/// Progress callback accepted by fetchers.
pub type ProgressFn<'a> = &'a (dyn Fn(DownloadProgress) + Send + Sync);

// ============================================================================
// Payload Fetcher
// ============================================================================

/// Fetches a remote payload into a local file.
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    /// Writes the body behind `url` to `dest`, returning the byte count.
    ///
    /// `dest` may be left partially written on error; the caller owns cleanup.
    async fn fetch(&self, url: &Url, dest: &Path, progress: ProgressFn<'_>) -> Result<u64>;
}

/// Streams payloads over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PayloadFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, dest: &Path, progress: ProgressFn<'_>) -> Result<u64> {
        info!("Downloading {} to {}", url, dest.display());

        // Ensure parent directory exists
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to start download from {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "Download failed with status {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            );
        }

        let total_bytes = response.content_length();
        debug!("Content-Length: {:?}", total_bytes);

        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;

        let mut stream = response.bytes_stream();
        let mut bytes_downloaded: u64 = 0;

        progress(DownloadProgress::new(0, total_bytes));

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.context("Failed to read chunk from response stream")?;

            file.write_all(&chunk)
                .await
                .context("Failed to write chunk to file")?;

            bytes_downloaded += chunk.len() as u64;
            progress(DownloadProgress::new(bytes_downloaded, total_bytes));
        }

        file.flush().await.context("Failed to flush file")?;

        info!(
            "Download complete: {} bytes written to {}",
            bytes_downloaded,
            dest.display()
        );

        Ok(bytes_downloaded)
    }
}
