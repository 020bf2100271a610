//! Transient user notifications.
//!
//! Toasts are queued server-side and drained into the next rendered page,
//! where they dismiss themselves after their duration.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Default display time.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(3);

/// Toasts kept before the oldest are dropped.
const MAX_QUEUED_TOASTS: usize = 16;

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

impl ToastLevel {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub duration: Duration,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: ToastLevel::Success,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: ToastLevel::Error,
            duration: DEFAULT_TOAST_DURATION,
        }
    }

    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Duration in milliseconds, for the client-side dismiss timer.
    #[must_use]
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);
}

/// In-memory toast queue shared between handlers.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    inner: Arc<Mutex<VecDeque<Toast>>>,
}

impl ToastQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every pending toast, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Toast> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success => tracing::info!(message = %toast.message, "Toast"),
            ToastLevel::Error => tracing::warn!(message = %toast.message, "Toast"),
        }

        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() >= MAX_QUEUED_TOASTS {
            queue.pop_front();
        }
        queue.push_back(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_in_order_and_empties() {
        let queue = ToastQueue::new();
        queue.notify(Toast::success("one"));
        queue.notify(Toast::error("two").with_duration(Duration::from_secs(5)));

        let toasts = queue.drain();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].message, "one");
        assert_eq!(toasts[1].level, ToastLevel::Error);
        assert_eq!(toasts[1].duration_ms(), 5000);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_is_capped() {
        let queue = ToastQueue::new();
        for i in 0..MAX_QUEUED_TOASTS + 4 {
            queue.notify(Toast::success(format!("toast {i}")));
        }
        let toasts = queue.drain();
        assert_eq!(toasts.len(), MAX_QUEUED_TOASTS);
        assert_eq!(toasts[0].message, "toast 4");
    }

    #[test]
    fn test_clones_share_queue() {
        let queue = ToastQueue::new();
        queue.clone().notify(Toast::success("shared"));
        assert_eq!(queue.len(), 1);
    }
}
