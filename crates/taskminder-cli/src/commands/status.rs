//! Notification queue status.

use serde::Serialize;
use sqlx::PgPool;

use crate::output::{self, OutputFormat};
use taskminder_core::error::AppError;
use taskminder_database::NotificationRepository;
use taskminder_entity::notification::JobStatus;

/// Queue counters
#[derive(Debug, Serialize)]
struct QueueStatus {
    scheduled: i64,
    sent: i64,
    failed: i64,
    canceled: i64,
    processing: i64,
}

/// Print notification counts per status plus the number currently owned
/// by a dispatcher
pub async fn execute(pool: &PgPool, format: OutputFormat) -> Result<(), AppError> {
    let repo = NotificationRepository::new(pool.clone());

    let mut counts = [0i64; 4];
    for (slot, status) in counts.iter_mut().zip(JobStatus::all()) {
        *slot = repo.count_by_status(status).await?;
    }
    let [scheduled, sent, failed, canceled] = counts;

    let status = QueueStatus {
        scheduled,
        sent,
        failed,
        canceled,
        processing: repo.count_processing().await?,
    };

    match format {
        OutputFormat::Json => output::print_json(&status),
        OutputFormat::Table => {
            println!("Notification queue:");
            output::print_kv("scheduled", &status.scheduled.to_string());
            output::print_kv("sent", &status.sent.to_string());
            output::print_kv("failed", &status.failed.to_string());
            output::print_kv("canceled", &status.canceled.to_string());
            output::print_kv("processing", &status.processing.to_string());
        }
    }

    Ok(())
}
