//! Recent notification listing.

use clap::Args;
use serde::Serialize;
use sqlx::PgPool;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use taskminder_core::error::AppError;
use taskminder_database::NotificationRepository;
use taskminder_entity::notification::{JobStatus, NotificationJob};

/// Arguments for the list command
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only show notifications in this status
    #[arg(short, long)]
    pub status: Option<JobStatus>,

    /// Maximum rows to show
    #[arg(short, long, default_value_t = 50)]
    pub limit: i64,
}

/// Notification display row for table output
#[derive(Debug, Serialize, Tabled)]
struct NotificationRow {
    /// Notification ID
    id: String,
    /// Recipient user
    user_id: String,
    /// Scheduled for (UTC)
    scheduled_for: String,
    /// Status
    status: String,
    /// Attempts
    attempts: i32,
    /// Owned by a dispatcher
    processing: bool,
    /// Retry gate (UTC)
    next_retry_at: String,
    /// Last recorded error
    last_error: String,
}

impl From<&NotificationJob> for NotificationRow {
    fn from(job: &NotificationJob) -> Self {
        Self {
            id: job.id.to_string(),
            user_id: job.user_id.to_string(),
            scheduled_for: job.scheduled_for.format("%Y-%m-%d %H:%M").to_string(),
            status: job.status.to_string(),
            attempts: job.attempts,
            processing: job.processing,
            next_retry_at: job
                .next_retry_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            last_error: job
                .payload
                .get("last_error")
                .and_then(|e| e.as_str())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// List the most recently scheduled notifications
pub async fn execute(
    args: &ListArgs,
    pool: &PgPool,
    format: OutputFormat,
) -> Result<(), AppError> {
    if args.limit <= 0 {
        return Err(AppError::validation("--limit must be positive"));
    }

    let repo = NotificationRepository::new(pool.clone());
    let jobs = repo.list_recent(args.status, args.limit).await?;

    let rows: Vec<NotificationRow> = jobs.iter().map(NotificationRow::from).collect();
    output::print_list(&rows, format);

    Ok(())
}
