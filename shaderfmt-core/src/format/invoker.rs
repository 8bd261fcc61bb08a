//! Runs the formatter binary against a single file.
//!
//! The binary is invoked as `<binary> <file>` and rewrites the file in place.
//! Its stdout is only diagnostic text; nothing is read back into the file.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::ShaderFmtError;
use crate::notice::NoticeSender;

/// One invocation: which file, with which binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    pub file_path: PathBuf,
    pub binary_path: PathBuf,
}

/// Classified result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    /// `None` when the process never started (or was killed by a signal).
    pub exit_code: Option<i32>,
    /// Everything the formatter printed. Always empty when it failed to
    /// start, since nothing was buffered yet.
    pub stdout: Vec<u8>,
    /// True iff the process started and exited with 0.
    pub succeeded: bool,
}

impl FormatResult {
    fn spawn_failed() -> Self {
        Self {
            exit_code: None,
            stdout: Vec::new(),
            succeeded: false,
        }
    }

    /// Buffered stdout as text, lossily decoded.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Spawns the formatter and reports failures as error notices.
#[derive(Debug, Clone)]
pub struct FormatInvoker {
    notices: NoticeSender,
}

impl FormatInvoker {
    pub fn new(notices: NoticeSender) -> Self {
        Self { notices }
    }

    /// Runs the formatter once and waits for it. No timeout.
    ///
    /// Exit code 0 is silent. A non-zero exit sends exactly one error notice.
    /// A spawn failure sends the OS error. No stdout was buffered at that
    /// point, so there is no second notice.
    pub async fn run(&self, request: &FormatRequest) -> FormatResult {
        info!(
            file = %request.file_path.display(),
            binary = %request.binary_path.display(),
            "Running shader-formatter"
        );

        let output = Command::new(&request.binary_path)
            .arg(&request.file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(source) => {
                let err = ShaderFmtError::Spawn {
                    binary: request.binary_path.clone(),
                    source,
                };
                warn!(binary = %request.binary_path.display(), error = %err, "Failed to start shader-formatter");
                self.notices.error(err.to_string());
                return FormatResult::spawn_failed();
            }
        };

        if !output.stderr.is_empty() {
            debug!(stderr = %String::from_utf8_lossy(&output.stderr), "shader-formatter stderr");
        }

        let result = FormatResult {
            exit_code: output.status.code(),
            succeeded: output.status.success(),
            stdout: output.stdout,
        };

        if result.succeeded {
            debug!(file = %request.file_path.display(), "Formatted");
        } else {
            let err = ShaderFmtError::NonZeroExit {
                code: result.exit_code,
                stdout: result.stdout_text(),
            };
            warn!(file = %request.file_path.display(), error = %err, "shader-formatter failed");
            self.notices.error(failure_message(&err));
        }

        result
    }
}

/// The formatter's own output when it printed any, the exit status otherwise.
fn failure_message(err: &ShaderFmtError) -> String {
    match err {
        ShaderFmtError::NonZeroExit { stdout, .. } if !stdout.trim().is_empty() => {
            stdout.trim_end().to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::notice::{drain, notice_channel};
    use tempfile::TempDir;

    /// `/bin/sh <script>` stands in for `<formatter> <file>`.
    fn script(dir: &TempDir, body: &str) -> FormatRequest {
        let path = dir.path().join("fake.hlsl");
        std::fs::write(&path, body).unwrap();
        FormatRequest {
            file_path: path,
            binary_path: PathBuf::from("/bin/sh"),
        }
    }

    #[tokio::test]
    async fn test_exit_zero_is_silent_success() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = notice_channel();
        let invoker = FormatInvoker::new(tx);

        let result = invoker.run(&script(&dir, "exit 0\n")).await;

        assert!(result.succeeded);
        assert_eq!(result.exit_code, Some(0));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit_reports_stdout_once() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = notice_channel();
        let invoker = FormatInvoker::new(tx);

        let result = invoker
            .run(&script(&dir, "echo 'parse error'\nexit 2\n"))
            .await;

        assert!(!result.succeeded);
        assert_eq!(result.exit_code, Some(2));
        assert_eq!(result.stdout_text(), "parse error\n");

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
        assert!(notices[0].message.contains("parse error"));
    }

    #[tokio::test]
    async fn test_silent_failure_reports_exit_code() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = notice_channel();
        let invoker = FormatInvoker::new(tx);

        invoker.run(&script(&dir, "exit 3\n")).await;

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "shader-formatter exited with code 3");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let (tx, mut rx) = notice_channel();
        let invoker = FormatInvoker::new(tx);

        let request = FormatRequest {
            file_path: dir.path().join("shader.hlsl"),
            binary_path: dir.path().join("no-such-formatter"),
        };
        let result = invoker.run(&request).await;

        assert!(!result.succeeded);
        assert_eq!(result.exit_code, None);
        assert!(result.stdout.is_empty());

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
    }

    #[tokio::test]
    async fn test_file_path_is_the_only_argument() {
        let dir = TempDir::new().unwrap();
        let (tx, _rx) = notice_channel();
        let invoker = FormatInvoker::new(tx);

        let result = invoker
            .run(&script(&dir, "echo \"$0 $#\"\nexit 0\n"))
            .await;

        let text = result.stdout_text();
        assert!(text.trim_end().ends_with("fake.hlsl 0"), "got {text}");
    }
}
