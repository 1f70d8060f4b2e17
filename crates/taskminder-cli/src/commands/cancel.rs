//! Cancel a scheduled reminder.

use sqlx::PgPool;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use taskminder_core::error::AppError;
use taskminder_database::{NotificationRepository, NotificationStore};
use taskminder_entity::notification::NotificationJob;

/// Cancel the notification with `id`
pub async fn execute(id: Uuid, pool: &PgPool, format: OutputFormat) -> Result<(), AppError> {
    let repo = NotificationRepository::new(pool.clone());
    let existing = repo.find_by_id(id).await?;
    cancel_reminder(&repo, existing, id).await?;

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "id": id,
            "status": "canceled",
        })),
        OutputFormat::Table => output::print_success(&format!("Reminder {id} canceled")),
    }

    Ok(())
}

/// Cancel `id`, given its current row. Only a scheduled job that no
/// dispatcher currently owns can be canceled.
pub async fn cancel_reminder(
    store: &dyn NotificationStore,
    existing: Option<NotificationJob>,
    id: Uuid,
) -> Result<(), AppError> {
    let Some(job) = existing else {
        return Err(AppError::not_found(format!("Notification {id} not found")));
    };

    if store.cancel(id).await? {
        return Ok(());
    }

    let reason = if job.processing {
        "is being delivered".to_string()
    } else {
        format!("is already {}", job.status)
    };
    Err(AppError::validation(format!(
        "Notification {id} cannot be canceled: it {reason}"
    )))
}
