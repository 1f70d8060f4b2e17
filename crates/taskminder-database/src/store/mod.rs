//! Store seams consumed by the dispatcher.
//!
//! Every write is guarded by `status = scheduled`: replaying an update on
//! a job that already reached a terminal status changes nothing and
//! returns `false`. `attempts` is only ever raised.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use taskminder_core::result::AppResult;
use taskminder_entity::notification::NotificationJob;
use taskminder_entity::profile::ContactProfile;

pub use memory::{MemoryNotificationStore, MemoryProfileStore};

/// Durable table of reminder notification jobs.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Select up to `limit` due WhatsApp jobs that are scheduled and not
    /// processing, flip `processing = true` on them, and return them
    /// oldest `scheduled_for` first. One atomic operation: concurrent
    /// callers never receive the same job.
    async fn claim_due(&self, limit: u32) -> AppResult<Vec<NotificationJob>>;

    /// Select due jobs without claiming them. Paired with
    /// [`mark_processing`](Self::mark_processing) this is the non-atomic
    /// claim path.
    async fn find_due(&self, limit: u32) -> AppResult<Vec<NotificationJob>>;

    /// Flip `processing = true` for those of `ids` that are still scheduled
    /// and not processing. Returns the ids actually marked; any other id
    /// was taken or finished by someone else in the meantime.
    async fn mark_processing(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>>;

    /// Record a successful delivery.
    async fn mark_sent(&self, id: Uuid, attempts: i32, delivery: &Value) -> AppResult<bool>;

    /// Record a permanent failure.
    async fn mark_failed(&self, id: Uuid, attempts: i32, error: &str) -> AppResult<bool>;

    /// Return the job to `scheduled` behind a retry gate.
    async fn reschedule(
        &self,
        id: Uuid,
        attempts: i32,
        next_retry_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<bool>;

    /// Drop ownership without touching status, attempts or the retry gate.
    /// `error`, when given, is recorded as `last_error`.
    async fn release(&self, id: Uuid, error: Option<&str>) -> AppResult<bool>;

    /// Move a scheduled job that nobody is delivering to `canceled`.
    /// Returns `false` when the job is terminal or currently claimed.
    async fn cancel(&self, id: Uuid) -> AppResult<bool>;
}

/// Read access to user contact profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync + std::fmt::Debug {
    /// Look up the contact profile of `user_id`.
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<ContactProfile>>;
}
