// SPDX-License-Identifier: MIT OR Apache-2.0
//! User-facing notifications (toasts).
//!
//! The canvas works without a notifier; when one is attached it receives
//! the same success/failure messages the host UI would show as toasts.

use parking_lot::Mutex;

/// Toast severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    /// Progress information
    Info,
    /// Operation succeeded
    Success,
    /// Operation succeeded with a caveat
    Warning,
    /// Operation failed
    Error,
}

/// A recorded toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Severity
    pub level: ToastLevel,
    /// Message text
    pub message: String,
}

/// Sink for toast notifications
pub trait Notifier: Send + Sync {
    /// Show a message to the user
    fn notify(&self, level: ToastLevel, message: &str);
}

/// Notifier that records toasts in memory
///
/// Hosts without a toast widget drain it after each operation.
#[derive(Debug, Default)]
pub struct ToastLog {
    entries: Mutex<Vec<Toast>>,
}

impl ToastLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all recorded toasts
    pub fn entries(&self) -> Vec<Toast> {
        self.entries.lock().clone()
    }

    /// Take all recorded toasts
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Whether any toast with `level` was recorded
    pub fn contains_level(&self, level: ToastLevel) -> bool {
        self.entries.lock().iter().any(|t| t.level == level)
    }
}

impl Notifier for ToastLog {
    fn notify(&self, level: ToastLevel, message: &str) {
        self.entries.lock().push(Toast {
            level,
            message: message.to_string(),
        });
    }
}
