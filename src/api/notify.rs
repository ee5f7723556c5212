//! Notification sink with real-time streaming via Server-Sent Events (SSE).
//!
//! Every failure and progress step in the pipeline reports a
//! `(message, severity, optional detail)` tuple here; the frontend consumes
//! the stream to drive toasts and the generation progress bar.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity for frontend display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Generation progress attached to a notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// One-based index of the unit being produced.
    pub current: usize,
    /// Total number of units in the run.
    pub total: usize,
}

/// A single notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    /// Diagnostic detail, when the failure carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            detail: None,
            progress: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
            detail: None,
            progress: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            detail: None,
            progress: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            detail: None,
            progress: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_progress(mut self, current: usize, total: usize) -> Self {
        self.progress = Some(Progress { current, total });
        self
    }
}

/// Global notice broadcaster.
pub static NOTIFIER: Lazy<Notifier> = Lazy::new(Notifier::new);

/// Broadcasts notices to all connected SSE clients.
pub struct Notifier {
    sender: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a notice to all subscribers.
    pub fn notify(&self, notice: Notice) {
        // Also print to stdout.
        let prefix = match notice.severity {
            Severity::Info => "   ",
            Severity::Success => "   ✓",
            Severity::Warning => "   ⚠️",
            Severity::Error => "   ❌",
        };
        match &notice.detail {
            Some(detail) => println!("{} {} ({})", prefix, notice.message, detail),
            None => println!("{} {}", prefix, notice.message),
        }

        // Broadcast to SSE clients (ignore if no receivers).
        let _ = self.sender.send(notice);
    }

    /// Get a receiver for SSE streaming.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient notification functions.
pub fn notify_info(msg: impl Into<String>) {
    NOTIFIER.notify(Notice::info(msg));
}

pub fn notify_success(msg: impl Into<String>) {
    NOTIFIER.notify(Notice::success(msg));
}

pub fn notify_warning(msg: impl Into<String>) {
    NOTIFIER.notify(Notice::warning(msg));
}

pub fn notify_error(msg: impl Into<String>, detail: impl Into<String>) {
    NOTIFIER.notify(Notice::error(msg).with_detail(detail));
}

pub fn notify_progress(current: usize, total: usize, label: &str) {
    NOTIFIER.notify(
        Notice::info(format!("Generujem {}/{}: {}", current, total, label))
            .with_progress(current, total),
    );
}
