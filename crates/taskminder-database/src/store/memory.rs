//! In-memory stores using a Tokio mutex for single-process deployments.
//!
//! Claims run under the one mutex, so the claim is atomic across any
//! number of dispatch loops sharing the same store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use taskminder_core::error::AppError;
use taskminder_core::result::AppResult;
use taskminder_entity::notification::{JobStatus, NotificationJob};
use taskminder_entity::profile::ContactProfile;

use super::{NotificationStore, ProfileStore};

/// Internal state for the in-memory notification store.
#[derive(Debug, Default)]
struct InnerState {
    /// Jobs keyed by id.
    jobs: HashMap<Uuid, NotificationJob>,
    /// Number of upcoming writes that should fail.
    failing_writes: u32,
    /// Whether claim/select calls should fail.
    claims_failing: bool,
}

impl InnerState {
    fn take_write_failure(&mut self) -> AppResult<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(AppError::database("Notification store write failed"));
        }
        Ok(())
    }

    fn check_claims(&self) -> AppResult<()> {
        if self.claims_failing {
            return Err(AppError::database("Notification store unreachable"));
        }
        Ok(())
    }

    fn due(&self, limit: u32, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut due: Vec<&NotificationJob> =
            self.jobs.values().filter(|j| j.is_claimable(now)).collect();
        due.sort_by_key(|j| (j.scheduled_for, j.created_at));
        due.into_iter().take(limit as usize).map(|j| j.id).collect()
    }

    /// The job, if it is still live.
    fn live_mut(&mut self, id: Uuid) -> Option<&mut NotificationJob> {
        self.jobs
            .get_mut(&id)
            .filter(|j| !j.status.is_terminal())
    }
}

/// In-memory notification store.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    /// Protected inner state.
    state: Arc<Mutex<InnerState>>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a job.
    pub async fn insert(&self, job: NotificationJob) {
        self.state.lock().await.jobs.insert(job.id, job);
    }

    /// Snapshot of a single job.
    pub async fn get(&self, id: Uuid) -> Option<NotificationJob> {
        self.state.lock().await.jobs.get(&id).cloned()
    }

    /// Snapshot of every job.
    pub async fn all(&self) -> Vec<NotificationJob> {
        self.state.lock().await.jobs.values().cloned().collect()
    }

    /// Make the next `count` writes fail with a database error.
    pub async fn fail_next_writes(&self, count: u32) {
        self.state.lock().await.failing_writes = count;
    }

    /// Make claim and select calls fail until reset.
    pub async fn set_claims_failing(&self, failing: bool) {
        self.state.lock().await.claims_failing = failing;
    }
}

fn merge_payload(payload: &mut Value, key: &str, value: Value) {
    match payload {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
        }
        other => {
            let mut map = serde_json::Map::new();
            map.insert(key.to_string(), value);
            *other = Value::Object(map);
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn claim_due(&self, limit: u32) -> AppResult<Vec<NotificationJob>> {
        let mut state = self.state.lock().await;
        state.check_claims()?;

        let now = Utc::now();
        let ids = state.due(limit, now);
        let mut claimed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = state.jobs.get_mut(&id) {
                job.processing = true;
                job.updated_at = now;
                claimed.push(job.clone());
            }
        }
        Ok(claimed)
    }

    async fn find_due(&self, limit: u32) -> AppResult<Vec<NotificationJob>> {
        let state = self.state.lock().await;
        state.check_claims()?;

        let ids = state.due(limit, Utc::now());
        Ok(ids
            .into_iter()
            .filter_map(|id| state.jobs.get(&id).cloned())
            .collect())
    }

    async fn mark_processing(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        let mut state = self.state.lock().await;
        state.take_write_failure()?;

        let now = Utc::now();
        let mut marked = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(job) = state.live_mut(*id).filter(|j| !j.processing) {
                job.processing = true;
                job.updated_at = now;
                marked.push(*id);
            }
        }
        Ok(marked)
    }

    async fn mark_sent(&self, id: Uuid, attempts: i32, delivery: &Value) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.take_write_failure()?;

        let Some(job) = state.live_mut(id) else {
            return Ok(false);
        };
        job.status = JobStatus::Sent;
        job.processing = false;
        job.attempts = job.attempts.max(attempts);
        merge_payload(&mut job.payload, "last_delivery", delivery.clone());
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_failed(&self, id: Uuid, attempts: i32, error: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.take_write_failure()?;

        let Some(job) = state.live_mut(id) else {
            return Ok(false);
        };
        job.status = JobStatus::Failed;
        job.processing = false;
        job.attempts = job.attempts.max(attempts);
        merge_payload(&mut job.payload, "last_error", Value::from(error));
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn reschedule(
        &self,
        id: Uuid,
        attempts: i32,
        next_retry_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.take_write_failure()?;

        let Some(job) = state.live_mut(id) else {
            return Ok(false);
        };
        job.processing = false;
        job.attempts = job.attempts.max(attempts);
        job.next_retry_at = Some(next_retry_at);
        merge_payload(&mut job.payload, "last_error", Value::from(error));
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn release(&self, id: Uuid, error: Option<&str>) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.take_write_failure()?;

        let Some(job) = state.live_mut(id) else {
            return Ok(false);
        };
        job.processing = false;
        if let Some(error) = error {
            merge_payload(&mut job.payload, "last_error", Value::from(error));
        }
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn cancel(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        state.take_write_failure()?;

        let Some(job) = state.live_mut(id).filter(|j| !j.processing) else {
            return Ok(false);
        };
        job.status = JobStatus::Canceled;
        job.updated_at = Utc::now();
        Ok(true)
    }
}

/// In-memory contact profile store.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<Mutex<HashMap<Uuid, ContactProfile>>>,
}

impl MemoryProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile.
    pub async fn upsert(&self, profile: ContactProfile) {
        self.profiles.lock().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<ContactProfile>> {
        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }
}
