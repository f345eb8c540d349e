use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Severity of an operator-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A transient message that dismisses itself after its time-to-live
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Holds the auto-expiring messages shown above the grid
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    ttl: Duration,
    notifications: Vec<Notification>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            notifications: Vec::new(),
        }
    }

    pub fn push_at(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Uuid {
        self.notifications.retain(|n| n.is_active_at(now));
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        let id = notification.id;
        self.notifications.push(notification);
        id
    }

    pub fn push_error(&mut self, message: impl Into<String>) -> Uuid {
        self.push_at(NotificationLevel::Error, message, Utc::now())
    }

    pub fn push_warning(&mut self, message: impl Into<String>) -> Uuid {
        self.push_at(NotificationLevel::Warning, message, Utc::now())
    }

    pub fn push_info(&mut self, message: impl Into<String>) -> Uuid {
        self.push_at(NotificationLevel::Info, message, Utc::now())
    }

    /// Drop expired messages and return the rest, oldest first
    pub fn active_at(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        self.notifications.retain(|n| n.is_active_at(now));
        self.notifications.clone()
    }

    pub fn active(&mut self) -> Vec<Notification> {
        self.active_at(Utc::now())
    }

    /// Returns whether a message with `id` was still showing
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }
}
