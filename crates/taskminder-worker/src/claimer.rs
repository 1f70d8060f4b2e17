//! Job claimer: takes exclusive ownership of a batch of due notifications.

use std::sync::Arc;

use uuid::Uuid;

use taskminder_core::config::ClaimMode;
use taskminder_core::result::AppResult;
use taskminder_database::NotificationStore;
use taskminder_entity::notification::NotificationJob;

/// Claims due WhatsApp notifications for one dispatch iteration.
#[derive(Debug, Clone)]
pub struct JobClaimer {
    /// Notification table.
    store: Arc<dyn NotificationStore>,
    /// Atomic claim or select-then-mark.
    mode: ClaimMode,
    /// Maximum jobs per claim.
    batch_size: u32,
}

impl JobClaimer {
    /// Create a new claimer
    pub fn new(store: Arc<dyn NotificationStore>, mode: ClaimMode, batch_size: u32) -> Self {
        if mode == ClaimMode::Fallback {
            tracing::warn!(
                "Claim mode 'fallback' is not atomic: concurrent dispatchers may deliver the same reminder twice"
            );
        }
        Self {
            store,
            mode,
            batch_size,
        }
    }

    /// Configured claim mode.
    pub fn mode(&self) -> ClaimMode {
        self.mode
    }

    /// Claim up to `batch_size` due jobs, oldest `scheduled_for` first.
    ///
    /// Every returned job has `processing = true` both in the store and in
    /// the returned copy. An empty batch is not an error.
    pub async fn claim(&self) -> AppResult<Vec<NotificationJob>> {
        let mut jobs = match self.mode {
            ClaimMode::Atomic => self.store.claim_due(self.batch_size).await?,
            ClaimMode::Fallback => self.claim_fallback().await?,
        };

        jobs.sort_by_key(|j| j.scheduled_for);

        if !jobs.is_empty() {
            tracing::debug!(claimed = jobs.len(), mode = ?self.mode, "Claimed notification batch");
        }
        Ok(jobs)
    }

    /// Give up ownership of a claimed job, optionally recording `reason`
    /// as its `last_error`. Status and attempts are left alone.
    pub async fn release(&self, id: Uuid, reason: Option<&str>) -> AppResult<bool> {
        self.store.release(id, reason).await
    }

    async fn claim_fallback(&self) -> AppResult<Vec<NotificationJob>> {
        let mut jobs = self.store.find_due(self.batch_size).await?;
        if jobs.is_empty() {
            return Ok(jobs);
        }

        let ids: Vec<Uuid> = jobs.iter().map(|j| j.id).collect();
        let marked = self.store.mark_processing(&ids).await?;
        if marked.len() < jobs.len() {
            tracing::debug!(
                selected = jobs.len(),
                marked = marked.len(),
                "Due notifications taken by another dispatcher"
            );
        }

        jobs.retain(|j| marked.contains(&j.id));
        for job in &mut jobs {
            job.processing = true;
        }
        Ok(jobs)
    }
}
