//! Positional parameters for the task reminder template.
//!
//! Rendering only reads the task snapshot stored on the notification, so a
//! reminder says what the task looked like when it was scheduled.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use taskminder_entity::notification::{ReminderPayload, TaskSnapshot};
use taskminder_messaging::TemplateMessage;

/// Header text when the payload carries no hint.
pub const DEFAULT_HEADER_HINT: &str = "15 min";
const FALLBACK_TITLE: &str = "(no title)";
const FALLBACK_TAG: &str = "Other";
const FALLBACK_STATUS: &str = "pending";

/// Header and body parameters, in template order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParams {
    /// `{{1}}` of the header.
    pub header: Vec<String>,
    /// `{{1}}..{{7}}` of the body: title, start, end, timezone hint, tag,
    /// status, description.
    pub body: Vec<String>,
}

/// Render the reminder template parameters. Never fails: missing values
/// become fallbacks or empty strings.
pub fn render(
    snapshot: &TaskSnapshot,
    tz_hint: Option<&str>,
    header_hint: Option<&str>,
) -> TemplateParams {
    let header = or_fallback(header_hint, DEFAULT_HEADER_HINT);

    let body = vec![
        or_fallback(snapshot.title.as_deref(), FALLBACK_TITLE),
        format_timestamp(snapshot.start_ts.as_deref()),
        format_timestamp(snapshot.end_ts.as_deref()),
        tz_hint.unwrap_or_default().to_string(),
        or_fallback(snapshot.tag.as_deref(), FALLBACK_TAG),
        or_fallback(snapshot.status.as_deref(), FALLBACK_STATUS),
        snapshot.description.clone().unwrap_or_default(),
    ];

    TemplateParams {
        header: vec![header],
        body,
    }
}

/// Build the outbound message for `payload`, addressed to `to`.
pub fn build_message(to: &str, payload: &ReminderPayload) -> TemplateMessage {
    let params = render(
        &payload.task_snapshot,
        payload.tz_hint.as_deref(),
        payload.header_hint.as_deref(),
    );

    TemplateMessage {
        to: to.to_string(),
        template_name: payload.template_name().to_string(),
        lang_code: payload.lang_code().to_string(),
        header_params: params.header,
        body_params: params.body,
        button_params: payload
            .button_param()
            .map(|p| vec![p.to_string()])
            .unwrap_or_default(),
    }
}

fn or_fallback(value: Option<&str>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Format an ISO-8601 timestamp as `YYYY-MM-DD HH:MM` in its own offset.
/// Unparseable input is passed through unchanged; absent input is empty.
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return String::new();
    };
    let trimmed = raw.trim();

    const OUT: &str = "%Y-%m-%d %H:%M";

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.format(OUT).to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return dt.format(OUT).to_string();
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return dt.format(OUT).to_string();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return dt.format(OUT).to_string();
        }
    }

    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> TaskSnapshot {
        TaskSnapshot {
            title: Some("Dentist".to_string()),
            description: Some("Bring x-rays".to_string()),
            tag: Some("Health".to_string()),
            status: Some("in_progress".to_string()),
            start_ts: Some("2025-10-23T19:45:00Z".to_string()),
            end_ts: Some("2025-10-23T20:30:00+00:00".to_string()),
        }
    }

    #[test]
    fn test_full_snapshot() {
        let params = render(&snapshot(), Some("PDT"), Some("30 min"));
        assert_eq!(params.header, vec!["30 min"]);
        assert_eq!(
            params.body,
            vec![
                "Dentist",
                "2025-10-23 19:45",
                "2025-10-23 20:30",
                "PDT",
                "Health",
                "in_progress",
                "Bring x-rays"
            ]
        );
    }

    #[test]
    fn test_empty_snapshot_uses_fallbacks() {
        let params = render(&TaskSnapshot::default(), None, None);
        assert_eq!(params.header, vec![DEFAULT_HEADER_HINT]);
        assert_eq!(
            params.body,
            vec!["(no title)", "", "", "", "Other", "pending", ""]
        );
    }

    #[test]
    fn test_empty_strings_take_fallbacks() {
        let snap = TaskSnapshot {
            title: Some(String::new()),
            tag: Some(String::new()),
            ..Default::default()
        };
        let params = render(&snap, Some(""), Some(""));
        assert_eq!(params.header, vec![DEFAULT_HEADER_HINT]);
        assert_eq!(params.body[0], "(no title)");
        assert_eq!(params.body[3], "");
        assert_eq!(params.body[4], "Other");
    }

    #[test]
    fn test_body_always_has_seven_params() {
        for snap in [snapshot(), TaskSnapshot::default()] {
            assert_eq!(render(&snap, None, None).body.len(), 7);
        }
    }

    #[test]
    fn test_timestamp_keeps_its_offset() {
        assert_eq!(
            format_timestamp(Some("2025-10-23T19:45:00-07:00")),
            "2025-10-23 19:45"
        );
        assert_eq!(
            format_timestamp(Some("2025-10-23T19:45:12.123456+00:00")),
            "2025-10-23 19:45"
        );
    }

    #[test]
    fn test_timestamp_naive_and_date_only() {
        assert_eq!(format_timestamp(Some("2025-10-23T07:05:00")), "2025-10-23 07:05");
        assert_eq!(format_timestamp(Some("2025-10-23 07:05")), "2025-10-23 07:05");
        assert_eq!(format_timestamp(Some("2025-10-23")), "2025-10-23 00:00");
    }

    #[test]
    fn test_unparseable_timestamp_passes_through() {
        assert_eq!(format_timestamp(Some("tomorrow at 9")), "tomorrow at 9");
        assert_eq!(format_timestamp(Some("")), "");
        assert_eq!(format_timestamp(None), "");
    }

    #[test]
    fn test_build_message_defaults_and_button() {
        let payload = ReminderPayload {
            include_button: true,
            button_param_text: Some("3d4ac02c".to_string()),
            task_snapshot: snapshot(),
            ..Default::default()
        };
        let message = build_message("5215551234567", &payload);
        assert_eq!(message.template_name, "rm_task_summary");
        assert_eq!(message.lang_code, "en");
        assert_eq!(message.button_params, vec!["3d4ac02c"]);
        assert_eq!(message.body_params.len(), 7);
    }
}
