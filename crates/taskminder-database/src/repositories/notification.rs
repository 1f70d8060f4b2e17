//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use taskminder_core::error::{AppError, ErrorKind};
use taskminder_core::result::AppResult;
use taskminder_entity::notification::{CreateNotificationJob, JobStatus, NotificationJob};

use crate::store::NotificationStore;

/// Eligibility predicate shared by the atomic and fallback claim paths.
const DUE_PREDICATE: &str = "channel = 'whatsapp' AND status = 'scheduled' AND processing = FALSE \
     AND ((next_retry_at IS NULL AND scheduled_for <= NOW()) \
       OR (next_retry_at IS NOT NULL AND next_retry_at <= NOW()))";

/// Repository for reminder notification rows.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationJob>> {
        sqlx::query_as::<_, NotificationJob>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find notification", e)
            })
    }

    /// List the most recently scheduled notifications, optionally by status.
    pub async fn list_recent(
        &self,
        status: Option<JobStatus>,
        limit: i64,
    ) -> AppResult<Vec<NotificationJob>> {
        sqlx::query_as::<_, NotificationJob>(
            "SELECT * FROM notifications \
             WHERE ($1::notification_status IS NULL OR status = $1) \
             ORDER BY scheduled_for DESC LIMIT $2",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))
    }

    /// Create a scheduled WhatsApp notification.
    pub async fn create(&self, data: &CreateNotificationJob) -> AppResult<NotificationJob> {
        sqlx::query_as::<_, NotificationJob>(
            "INSERT INTO notifications (user_id, task_id, channel, scheduled_for, status, payload) \
             VALUES ($1, $2, 'whatsapp', $3, 'scheduled', $4) RETURNING *",
        )
        .bind(data.user_id)
        .bind(data.task_id)
        .bind(data.scheduled_for)
        .bind(&data.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    /// Count notifications in a given status.
    pub async fn count_by_status(&self, status: JobStatus) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count notifications", e)
            })
    }

    /// Count notifications currently owned by a dispatcher.
    pub async fn count_processing(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE processing = TRUE")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count processing", e)
            })
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn claim_due(&self, limit: u32) -> AppResult<Vec<NotificationJob>> {
        let limit = i32::try_from(limit)
            .map_err(|_| AppError::validation(format!("Claim limit {limit} is out of range")))?;
        sqlx::query_as::<_, NotificationJob>("SELECT * FROM claim_notifications($1)")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to claim notifications", e)
            })
    }

    async fn find_due(&self, limit: u32) -> AppResult<Vec<NotificationJob>> {
        let sql = format!(
            "SELECT * FROM notifications WHERE {DUE_PREDICATE} ORDER BY scheduled_for ASC LIMIT $1"
        );
        sqlx::query_as::<_, NotificationJob>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to select due notifications", e)
            })
    }

    async fn mark_processing(&self, ids: &[Uuid]) -> AppResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE notifications SET processing = TRUE, updated_at = NOW() \
             WHERE id = ANY($1) AND status = 'scheduled' AND processing = FALSE \
             RETURNING id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark notifications processing", e)
        })
    }

    async fn mark_sent(&self, id: Uuid, attempts: i32, delivery: &Value) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'sent', processing = FALSE, \
             attempts = GREATEST(attempts, $2), \
             payload = COALESCE(payload, '{}'::jsonb) || jsonb_build_object('last_delivery', $3::jsonb), \
             updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(attempts)
        .bind(delivery)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark notification sent", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(&self, id: Uuid, attempts: i32, error: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'failed', processing = FALSE, \
             attempts = GREATEST(attempts, $2), \
             payload = COALESCE(payload, '{}'::jsonb) || jsonb_build_object('last_error', $3::text), \
             updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(attempts)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark notification failed", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn reschedule(
        &self,
        id: Uuid,
        attempts: i32,
        next_retry_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET processing = FALSE, \
             attempts = GREATEST(attempts, $2), next_retry_at = $3, \
             payload = COALESCE(payload, '{}'::jsonb) || jsonb_build_object('last_error', $4::text), \
             updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(attempts)
        .bind(next_retry_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reschedule notification", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, id: Uuid, error: Option<&str>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET processing = FALSE, \
             payload = CASE WHEN $2::text IS NULL THEN payload \
                 ELSE COALESCE(payload, '{}'::jsonb) || jsonb_build_object('last_error', $2::text) END, \
             updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled'",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to release notification", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn cancel(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'canceled', updated_at = NOW() \
             WHERE id = $1 AND status = 'scheduled' AND processing = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to cancel notification", e)
        })?;
        Ok(result.rows_affected() > 0)
    }
}
