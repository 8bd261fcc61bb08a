//! Error taxonomy for the binary lifecycle and the format pipeline.
//!
//! Each variant maps to one failure channel. Whether a variant is fatal depends
//! on where it surfaces: `Network` degrades silently during the update cycle,
//! `Permission` is only a warning, and the format-time variants abort a single
//! save event.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderFmtError {
    /// The latest release could not be resolved.
    #[error("Failed to resolve the latest shader-formatter release: {0}")]
    Network(String),

    /// The binary payload could not be fetched or stored.
    #[error("failed to download shader-formatter v{version}: {reason}")]
    Download { version: String, reason: String },

    /// The execute bit could not be set on a downloaded binary.
    #[error("failed to add 'execute' permission to file {}", path.display())]
    Permission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither an override path nor a cached binary is available.
    #[error(
        "shader-formatter binary is not downloaded and path to binary is not set in settings"
    )]
    Configuration,

    /// The formatter process could not be started.
    #[error("{source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The formatter ran and reported failure.
    #[error("shader-formatter exited with {}", describe_exit(*code))]
    NonZeroExit { code: Option<i32>, stdout: String },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ShaderFmtError {
    /// Builds a `Download` error from anything displayable.
    pub fn download(version: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Download {
            version: version.into(),
            reason: reason.to_string(),
        }
    }
}
