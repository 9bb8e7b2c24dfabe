//! # Operator Notifications
//!
//! Retry and failure notices addressed to the configured recipients. Delivery
//! is pluggable; the bundled [`LoggingNotifier`] writes them to the log.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::models::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// An attempt failed and another one is scheduled
    Retry,
    /// The retry budget is exhausted
    Failure,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub dag_id: String,
    pub run_id: Uuid,
    pub logical_date: NaiveDate,
    pub task_id: TaskId,
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: String,
    /// Delay before the next attempt, for retry notices
    pub retry_in: Option<Duration>,
    pub recipients: Vec<String>,
}

impl Notification {
    pub fn subject(&self) -> String {
        match self.kind {
            NotificationKind::Retry => format!(
                "[{}] Retry {}/{}: {} ({})",
                self.dag_id, self.attempt, self.max_attempts, self.task_id, self.logical_date
            ),
            NotificationKind::Failure => format!(
                "[{}] Failed: {} ({}) after {} attempts",
                self.dag_id, self.task_id, self.logical_date, self.attempt
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivers notifications to operators
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        warn!(
            kind = %notification.kind,
            dag_id = %notification.dag_id,
            run_id = %notification.run_id,
            task_id = %notification.task_id,
            attempt = notification.attempt,
            max_attempts = notification.max_attempts,
            error = %notification.error,
            recipients = ?notification.recipients,
            "{}",
            notification.subject()
        );
        Ok(())
    }
}
