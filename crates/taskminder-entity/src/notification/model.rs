//! Notification job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::{Channel, JobStatus};

/// A scheduled reminder delivery.
///
/// `payload` holds the render hints and task snapshot written at creation
/// time, plus `last_delivery` / `last_error` diagnostics written by the
/// dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationJob {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Recipient user.
    pub user_id: Uuid,
    /// Source task, if it still exists.
    pub task_id: Option<Uuid>,
    /// Outbound channel.
    pub channel: Channel,
    /// Earliest delivery time.
    pub scheduled_for: DateTime<Utc>,
    /// Backoff gate set after a failed delivery attempt.
    pub next_retry_at: Option<DateTime<Utc>>,
    /// Delivery status.
    pub status: JobStatus,
    /// Set while a dispatcher owns the row.
    pub processing: bool,
    /// Delivery attempts made so far.
    pub attempts: i32,
    /// Render hints, task snapshot and diagnostics (JSON).
    pub payload: serde_json::Value,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl NotificationJob {
    /// Whether the job is due at `now`, ignoring ownership and status.
    ///
    /// A pending retry gate replaces `scheduled_for` entirely.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_retry_at {
            Some(retry_at) => retry_at <= now,
            None => self.scheduled_for <= now,
        }
    }

    /// Whether a dispatcher may claim the job at `now`.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.channel == Channel::Whatsapp
            && self.status == JobStatus::Scheduled
            && !self.processing
            && self.is_due(now)
    }
}

/// Data required to create a new notification job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationJob {
    /// Recipient user.
    pub user_id: Uuid,
    /// Source task.
    pub task_id: Option<Uuid>,
    /// Earliest delivery time.
    pub scheduled_for: DateTime<Utc>,
    /// Render hints and task snapshot.
    pub payload: serde_json::Value,
}
