//! User-visible notices.
//!
//! Components never print. They push `Notice` values into an unbounded channel
//! and whatever hosts the library (terminal, editor bridge, tests) drains it.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

// =============================================================================
// Notices
// =============================================================================

/// Severity of a notice. There is no finer grading than this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A plain-text message meant for the user.
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

// =============================================================================
// Channel Types
// =============================================================================

/// Receiver for notices.
pub type NoticeReceiver = mpsc::UnboundedReceiver<Notice>;

/// Sending half of the notice channel.
///
/// Cloneable; every component that reports to the user holds one.
#[derive(Debug, Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    /// Sends an informational notice.
    pub fn info(&self, message: impl Into<String>) {
        self.send(Notice::info(message));
    }

    /// Sends an error notice.
    pub fn error(&self, message: impl Into<String>) {
        self.send(Notice::error(message));
    }

    /// Sends a notice. A closed receiver is not an error for the sender.
    pub fn send(&self, notice: Notice) {
        if let Err(e) = self.tx.send(notice) {
            debug!(message = %e.0.message, "Notice dropped, receiver closed");
        }
    }
}

/// Create a notice channel.
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}

/// Drains every notice currently queued, without waiting.
#[cfg(test)]
pub(crate) fn drain(rx: &mut NoticeReceiver) -> Vec<Notice> {
    let mut notices = Vec::new();
    while let Ok(notice) = rx.try_recv() {
        notices.push(notice);
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_arrive_in_order() {
        let (tx, mut rx) = notice_channel();
        tx.info("first");
        tx.error("second");

        let notices = drain(&mut rx);
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert_eq!(notices[0].message, "first");
        assert!(notices[1].is_error());
        assert_eq!(notices[1].message, "second");
    }

    #[test]
    fn test_send_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = notice_channel();
        drop(rx);
        tx.error("nobody listening");
    }

    #[test]
    fn test_drain_empty() {
        let (_tx, mut rx) = notice_channel();
        assert!(drain(&mut rx).is_empty());
    }
}
