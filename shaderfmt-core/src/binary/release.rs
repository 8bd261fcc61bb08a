//! Latest-release resolution.
//!
//! The release host exposes a stable "latest" URL that redirects to the page
//! of the newest tag. The last path segment of the redirect target is the raw
//! version tag (`v1.4.2`). No API token and no JSON parsing are involved.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use super::paths::BINARY_NAME;
use super::types::{PlatformProfile, ReleaseVersion};
use crate::error::ShaderFmtError;

/// Stable URL that redirects to the newest release.
pub const DEFAULT_LATEST_RELEASE_URL: &str =
    "https://github.com/Flone-dnb/shader-formatter/releases/latest/";

/// User agent for every request we make.
pub const USER_AGENT: &str = concat!("shaderfmt/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by the resolver and the downloader.
///
/// Redirects are followed with reqwest's default policy. There is no request
/// timeout: a hung remote hangs only the update cycle that asked.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).build()
}

// ============================================================================
// Release Endpoint
// ============================================================================

/// Where releases are resolved and downloaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEndpoint {
    /// The "latest release" URL, always ending in `/`.
    pub latest_url: Url,
    /// Asset name of the binary.
    pub binary_name: String,
}

impl ReleaseEndpoint {
    /// Creates an endpoint rooted at `latest_url`.
    pub fn new(latest_url: &str) -> Result<Self, url::ParseError> {
        let mut raw = latest_url.to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        Ok(Self {
            latest_url: Url::parse(&raw)?,
            binary_name: BINARY_NAME.to_string(),
        })
    }

    /// Download URL of the binary: `<latest>/download/<name><suffix>`.
    pub fn download_url(&self, platform: PlatformProfile) -> Result<Url, url::ParseError> {
        self.latest_url.join(&format!(
            "download/{}{}",
            self.binary_name, platform.executable_suffix
        ))
    }
}

impl Default for ReleaseEndpoint {
    fn default() -> Self {
        Self {
            latest_url: Url::parse(DEFAULT_LATEST_RELEASE_URL)
                .expect("default release URL is valid"),
            binary_name: BINARY_NAME.to_string(),
        }
    }
}

// ============================================================================
// Version Source
// ============================================================================

/// Anything that can tell which release is the newest.
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Resolves the latest version. One attempt, no retry.
    async fn latest_version(&self) -> Result<ReleaseVersion, ShaderFmtError>;
}

/// Resolves the latest version by following the "latest" redirect.
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    client: Client,
    endpoint: ReleaseEndpoint,
}

impl ReleaseResolver {
    pub fn new(client: Client, endpoint: ReleaseEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl VersionSource for ReleaseResolver {
    async fn latest_version(&self) -> Result<ReleaseVersion, ShaderFmtError> {
        let requested = &self.endpoint.latest_url;
        debug!(url = %requested, "Resolving latest release");

        let response = self
            .client
            .get(requested.clone())
            .send()
            .await
            .map_err(|e| ShaderFmtError::Network(e.to_string()))?;

        let location = response.url();
        let raw = tag_from_location(requested, location).ok_or_else(|| {
            ShaderFmtError::Network(format!("no resolvable location behind {}", requested))
        })?;

        let version = ReleaseVersion::new(raw);
        if version.is_empty() {
            return Err(ShaderFmtError::Network(format!(
                "release tag '{}' has no version",
                raw
            )));
        }

        info!(%version, location = %location, "Resolved latest release");
        Ok(version)
    }
}

/// Extracts the raw tag from the final location of a redirect chain.
///
/// A location equal to the requested URL means no redirect happened, which
/// leaves nothing to read a tag from.
fn tag_from_location<'a>(requested: &Url, location: &'a Url) -> Option<&'a str> {
    if location == requested {
        return None;
    }

    location
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
}
