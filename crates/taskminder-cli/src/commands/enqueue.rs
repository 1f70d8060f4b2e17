//! Schedule a WhatsApp reminder for a task.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use clap::Args;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::output::{self, OutputFormat};
use taskminder_core::error::AppError;
use taskminder_database::NotificationRepository;
use taskminder_entity::notification::CreateNotificationJob;
use taskminder_entity::notification::payload::{
    DEFAULT_LANG_CODE, DEFAULT_TEMPLATE_NAME, MODE_TEMPLATE_BY_TASK,
};

/// Lead time used when neither `--minutes-before` nor `--at` is given.
const DEFAULT_MINUTES_BEFORE: i64 = 15;

/// Arguments for the enqueue command
#[derive(Debug, Args, Validate)]
pub struct EnqueueArgs {
    /// Recipient user ID
    #[arg(long)]
    pub user: Uuid,

    /// Source task ID
    #[arg(long)]
    pub task: Option<Uuid>,

    /// Task title
    #[arg(long)]
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,

    /// Task start (RFC 3339, e.g. 2025-10-23T19:45:00-07:00)
    #[arg(long)]
    pub start: DateTime<FixedOffset>,

    /// Task end (RFC 3339)
    #[arg(long)]
    pub end: Option<DateTime<FixedOffset>>,

    /// Task tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Task description
    #[arg(long)]
    pub description: Option<String>,

    /// Task status
    #[arg(long, default_value = "pending")]
    pub task_status: String,

    /// Send this many minutes before the task starts
    #[arg(long, conflicts_with = "at")]
    #[validate(range(min = 0, max = 1440, message = "minutes_before must be within 0..=1440"))]
    pub minutes_before: Option<i64>,

    /// Send at this exact time instead (RFC 3339)
    #[arg(long)]
    pub at: Option<DateTime<FixedOffset>>,

    /// Approved template name
    #[arg(long, default_value = DEFAULT_TEMPLATE_NAME)]
    #[validate(length(min = 1, message = "template must not be empty"))]
    pub template: String,

    /// Template language code
    #[arg(long, default_value = DEFAULT_LANG_CODE)]
    #[validate(length(min = 2, max = 16, message = "lang must be 2-16 characters"))]
    pub lang: String,

    /// Template header text (defaults to "<minutes> min")
    #[arg(long)]
    pub header_hint: Option<String>,

    /// Timezone label shown in the message body
    #[arg(long)]
    pub tz_hint: Option<String>,

    /// URL button parameter, for templates with a dynamic button
    #[arg(long)]
    pub button_param: Option<String>,
}

/// Create the notification row
pub async fn execute(
    args: &EnqueueArgs,
    pool: &PgPool,
    format: OutputFormat,
) -> Result<(), AppError> {
    let data = build_reminder(args, Utc::now())?;

    let repo = NotificationRepository::new(pool.clone());
    let job = repo.create(&data).await?;

    match format {
        OutputFormat::Json => output::print_json(&job),
        OutputFormat::Table => {
            output::print_success(&format!("Reminder {} scheduled", job.id));
            output::print_kv("scheduled_for", &job.scheduled_for.to_rfc3339());
            output::print_kv("user_id", &job.user_id.to_string());
        }
    }

    Ok(())
}

/// Validate the arguments and build the reminder row as of `now`.
pub fn build_reminder(
    args: &EnqueueArgs,
    now: DateTime<Utc>,
) -> Result<CreateNotificationJob, AppError> {
    args.validate()
        .map_err(|e| AppError::validation(format!("Invalid reminder: {e}")))?;

    if let Some(end) = args.end {
        if end < args.start {
            return Err(AppError::validation("--end must not be before --start"));
        }
    }

    let (scheduled_for, lead_minutes) = match args.at {
        Some(at) => {
            let at = at.with_timezone(&Utc);
            (at, (args.start.with_timezone(&Utc) - at).num_minutes())
        }
        None => {
            let minutes = args.minutes_before.unwrap_or(DEFAULT_MINUTES_BEFORE);
            (
                args.start.with_timezone(&Utc) - Duration::minutes(minutes),
                minutes,
            )
        }
    };

    if scheduled_for <= now {
        return Err(AppError::validation(format!(
            "Reminder time {} is in the past",
            scheduled_for.to_rfc3339()
        )));
    }

    let header_hint = match args.header_hint.as_deref() {
        Some(hint) if !hint.is_empty() => hint.to_string(),
        _ => format!("{} min", lead_minutes.max(0)),
    };

    Ok(CreateNotificationJob {
        user_id: args.user,
        task_id: args.task,
        scheduled_for,
        payload: reminder_payload(args, header_hint),
    })
}

fn reminder_payload(args: &EnqueueArgs, header_hint: String) -> Value {
    json!({
        "mode": MODE_TEMPLATE_BY_TASK,
        "template_name": args.template,
        "lang_code": args.lang,
        "tz_hint": args.tz_hint.clone().unwrap_or_default(),
        "header_hint": header_hint,
        "include_button": args.button_param.is_some(),
        "button_param_text": args.button_param,
        "task_snapshot": {
            "title": args.title,
            "description": args.description.clone().unwrap_or_default(),
            "tag": args.tag.clone().unwrap_or_else(|| "Other".to_string()),
            "status": args.task_status,
            "start_ts": args.start.to_rfc3339(),
            "end_ts": args.end.map(|e| e.to_rfc3339()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        args: EnqueueArgs,
    }

    fn parse(extra: &[&str]) -> EnqueueArgs {
        let mut argv = vec![
            "enqueue",
            "--user",
            "3d4ac02c-5f8a-4c14-970f-7da20e46af97",
            "--title",
            "Standup",
            "--start",
            "2025-10-23T19:45:00-07:00",
        ];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).unwrap().args
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-23T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_minutes_before_sets_schedule_and_header() {
        let data = build_reminder(&parse(&["--minutes-before", "30"]), now()).unwrap();

        assert_eq!(data.scheduled_for.to_rfc3339(), "2025-10-24T02:15:00+00:00");
        assert_eq!(data.payload["header_hint"], "30 min");
        assert_eq!(data.payload["mode"], "template_by_task");
        assert_eq!(data.payload["template_name"], "rm_task_summary");
        assert_eq!(data.payload["include_button"], false);
        assert_eq!(data.payload["task_snapshot"]["tag"], "Other");
        assert_eq!(
            data.payload["task_snapshot"]["start_ts"],
            "2025-10-23T19:45:00-07:00"
        );
    }

    #[test]
    fn test_explicit_time_wins() {
        let args = parse(&["--at", "2025-10-23T19:00:00-07:00", "--header-hint", "soon"]);
        let data = build_reminder(&args, now()).unwrap();

        assert_eq!(data.scheduled_for.to_rfc3339(), "2025-10-24T02:00:00+00:00");
        assert_eq!(data.payload["header_hint"], "soon");
    }

    #[test]
    fn test_minutes_and_time_conflict() {
        let argv = [
            "enqueue",
            "--user",
            "3d4ac02c-5f8a-4c14-970f-7da20e46af97",
            "--title",
            "Standup",
            "--start",
            "2025-10-23T19:45:00-07:00",
            "--minutes-before",
            "5",
            "--at",
            "2025-10-23T19:00:00-07:00",
        ];
        assert!(TestCli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_minutes_out_of_range() {
        let err = build_reminder(&parse(&["--minutes-before", "1441"]), now()).unwrap_err();
        assert_eq!(err.kind, taskminder_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_past_time_rejected() {
        let late = DateTime::parse_from_rfc3339("2025-10-24T03:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(build_reminder(&parse(&[]), late).is_err());
    }

    #[test]
    fn test_button_param_enables_button() {
        let data = build_reminder(&parse(&["--button-param", "3d4ac02c"]), now()).unwrap();
        assert_eq!(data.payload["include_button"], true);
        assert_eq!(data.payload["button_param_text"], "3d4ac02c");
        assert_eq!(data.payload["header_hint"], "15 min");
    }
}
