use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub created: DateTime<Utc>,
}

/// Transient one-line messages shown at the bottom of the screen.
/// Only the most recent message is kept.
pub struct Notifier {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    current: Option<Notification>,
}

impl Notifier {
    pub const DEFAULT_TTL_SECS: i64 = 4;

    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::seconds(Self::DEFAULT_TTL_SECS))
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            current: None,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NotificationKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.push(NotificationKind::Error, message);
    }

    fn push(&mut self, kind: NotificationKind, message: String) {
        self.current = Some(Notification {
            kind,
            message,
            created: self.clock.now(),
        });
    }

    /// Drop the current message once its time is up.
    pub fn expire(&mut self) {
        let now = self.clock.now();
        if self
            .current
            .as_ref()
            .is_some_and(|n| now - n.created >= self.ttl)
        {
            self.current = None;
        }
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
