//! Delivery attempt handler: one send and the resulting state transition.
//!
//! Outcomes fall into three classes:
//!
//! - **Sent**: the gateway accepted the message. `attempts + 1`, terminal.
//! - **Delivery error**: the gateway reported a failure (including a
//!   request timeout). `attempts + 1`, then either a backoff reschedule or
//!   a terminal failure once `max_attempts` is reached.
//! - **Infrastructure error**: anything else (store write, payload decode).
//!   `attempts` unchanged, ownership released, retried on the next poll.
//!
//! A missing recipient and an unsupported payload mode are permanent
//! failures that do not consume an attempt.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use taskminder_core::error::AppError;
use taskminder_core::result::AppResult;
use taskminder_database::{NotificationStore, ProfileStore};
use taskminder_entity::notification::{NotificationJob, ReminderPayload};
use taskminder_messaging::MessagingGateway;

use crate::backoff::backoff_delay;
use crate::template::build_message;

/// Failure reason recorded when the recipient cannot be reached.
pub const NO_RECIPIENT_REASON: &str = "no phone or notifications disabled";

/// Result of handling one claimed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Delivered; the job is now `sent`.
    Sent {
        /// Attempts after this one.
        attempts: i32,
    },
    /// Delivery failed; the job is `scheduled` again behind a retry gate.
    Rescheduled {
        /// Attempts after this one.
        attempts: i32,
        /// When the job becomes due again.
        next_retry_at: DateTime<Utc>,
        /// Recorded `last_error`.
        error: String,
    },
    /// The job is now `failed`.
    Failed {
        /// Attempts recorded on the job.
        attempts: i32,
        /// Recorded `last_error`.
        reason: String,
    },
    /// Infrastructure error; ownership dropped, nothing else changed.
    Released {
        /// Recorded `last_error`.
        reason: String,
    },
}

/// Performs a single delivery attempt for a claimed job.
#[derive(Debug, Clone)]
pub struct DeliveryAttemptHandler {
    notifications: Arc<dyn NotificationStore>,
    profiles: Arc<dyn ProfileStore>,
    gateway: Arc<dyn MessagingGateway>,
    max_attempts: i32,
}

impl DeliveryAttemptHandler {
    /// Create a new handler
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        profiles: Arc<dyn ProfileStore>,
        gateway: Arc<dyn MessagingGateway>,
        max_attempts: i32,
    ) -> Self {
        Self {
            notifications,
            profiles,
            gateway,
            max_attempts,
        }
    }

    /// Handle one claimed job. Never fails: every error is absorbed into
    /// the job's stored state and the returned outcome.
    pub async fn handle(&self, job: &NotificationJob) -> AttemptOutcome {
        match self.attempt(job).await {
            Ok(outcome) => outcome,
            Err(e) => self.release_after_error(job, e).await,
        }
    }

    async fn attempt(&self, job: &NotificationJob) -> AppResult<AttemptOutcome> {
        let payload = ReminderPayload::from_json(&job.payload)?;

        let contact = self.profiles.find_contact(job.user_id).await?;
        let Some(phone) = contact.as_ref().and_then(|c| c.deliverable_phone()) else {
            tracing::warn!(
                job_id = %job.id,
                user_id = %job.user_id,
                "Recipient has no phone or disabled notifications"
            );
            return self.fail(job, job.attempts, NO_RECIPIENT_REASON).await;
        };

        if !payload.is_supported_mode() {
            let reason = format!(
                "unsupported mode: {}",
                payload.mode.as_deref().unwrap_or_default()
            );
            return self.fail(job, job.attempts, &reason).await;
        }

        let message = build_message(phone, &payload);
        let attempts = job.attempts.saturating_add(1);

        match self.gateway.send_template(&message).await {
            Ok(delivery) => {
                let applied = self
                    .notifications
                    .mark_sent(job.id, attempts, &delivery)
                    .await?;
                warn_if_skipped(job, applied);
                tracing::info!(
                    job_id = %job.id,
                    attempts,
                    gateway = self.gateway.name(),
                    "Reminder sent"
                );
                Ok(AttemptOutcome::Sent { attempts })
            }
            Err(err) => {
                let error = err.to_string();
                if attempts >= self.max_attempts {
                    return self.fail(job, attempts, &error).await;
                }

                let next_retry_at = Utc::now() + backoff_delay(attempts);
                let applied = self
                    .notifications
                    .reschedule(job.id, attempts, next_retry_at, &error)
                    .await?;
                warn_if_skipped(job, applied);
                tracing::warn!(
                    job_id = %job.id,
                    attempts,
                    next_retry_at = %next_retry_at,
                    error = %error,
                    "Delivery failed, rescheduled"
                );
                Ok(AttemptOutcome::Rescheduled {
                    attempts,
                    next_retry_at,
                    error,
                })
            }
        }
    }

    async fn fail(
        &self,
        job: &NotificationJob,
        attempts: i32,
        reason: &str,
    ) -> AppResult<AttemptOutcome> {
        let applied = self
            .notifications
            .mark_failed(job.id, attempts, reason)
            .await?;
        warn_if_skipped(job, applied);
        tracing::error!(job_id = %job.id, attempts, reason, "Reminder failed permanently");
        Ok(AttemptOutcome::Failed {
            attempts,
            reason: reason.to_string(),
        })
    }

    async fn release_after_error(&self, job: &NotificationJob, err: AppError) -> AttemptOutcome {
        let reason = format!("unexpected: {err}");
        tracing::error!(
            job_id = %job.id,
            attempts = job.attempts,
            error = %err,
            "Unexpected error while dispatching, releasing job"
        );

        if let Err(e) = self.notifications.release(job.id, Some(&reason)).await {
            tracing::error!(
                job_id = %job.id,
                error = %e,
                "Failed to release job; it stays claimed"
            );
        }
        AttemptOutcome::Released { reason }
    }
}

/// Guarded writes touch nothing once the job left `scheduled`.
fn warn_if_skipped(job: &NotificationJob, applied: bool) {
    if !applied {
        tracing::warn!(job_id = %job.id, "Job no longer scheduled; update skipped");
    }
}
