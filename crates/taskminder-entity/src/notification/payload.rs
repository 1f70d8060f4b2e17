//! Typed view over the notification `payload` column.
//!
//! The column is free-form JSON written by the reminder routes and updated
//! by the dispatcher, so decoding is lenient: scalar fields of the wrong
//! JSON type are stringified, nulls and absent keys become `None`, and
//! unknown keys (including `last_delivery` / `last_error`) are ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Payload mode understood by the dispatcher.
pub const MODE_TEMPLATE_BY_TASK: &str = "template_by_task";

/// Template used when the payload does not name one.
pub const DEFAULT_TEMPLATE_NAME: &str = "rm_task_summary";

/// Template language used when the payload does not name one.
pub const DEFAULT_LANG_CODE: &str = "en";

/// Denormalized copy of the task taken when the reminder was created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tag: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    /// ISO-8601 start, as stored.
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_ts: Option<String>,
    /// ISO-8601 end, as stored.
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_ts: Option<String>,
}

/// Render hints stored on a reminder notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub template_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lang_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub header_hint: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tz_hint: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub include_button: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub button_param_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_snapshot")]
    pub task_snapshot: TaskSnapshot,
}

impl ReminderPayload {
    /// Decode a stored payload. `null` decodes to the default payload;
    /// anything other than an object is an error.
    pub fn from_json(value: &Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => Self::deserialize(value),
            _ => Err(serde::de::Error::custom(
                "notification payload must be a JSON object",
            )),
        }
    }

    /// Template name, defaulting to [`DEFAULT_TEMPLATE_NAME`].
    pub fn template_name(&self) -> &str {
        non_empty(self.template_name.as_deref()).unwrap_or(DEFAULT_TEMPLATE_NAME)
    }

    /// Language code, defaulting to [`DEFAULT_LANG_CODE`].
    pub fn lang_code(&self) -> &str {
        non_empty(self.lang_code.as_deref()).unwrap_or(DEFAULT_LANG_CODE)
    }

    /// Whether the dispatcher knows how to render this payload.
    pub fn is_supported_mode(&self) -> bool {
        match non_empty(self.mode.as_deref()) {
            None => true,
            Some(mode) => mode == MODE_TEMPLATE_BY_TASK,
        }
    }

    /// Button URL parameter, when the template carries a dynamic button.
    pub fn button_param(&self) -> Option<&str> {
        if !self.include_button {
            return None;
        }
        non_empty(self.button_param_text.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

fn lenient_snapshot<'de, D>(deserializer: D) -> Result<TaskSnapshot, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(obj @ Value::Object(_)) => TaskSnapshot::deserialize(obj).unwrap_or_default(),
        _ => TaskSnapshot::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_payload_ignores_diagnostics() {
        let payload = ReminderPayload::from_json(&json!({
            "mode": "template_by_task",
            "template_name": "rm_task_summary",
            "lang_code": "es_MX",
            "tz_hint": "PDT",
            "header_hint": "15 min",
            "include_button": false,
            "button_param_text": null,
            "task_snapshot": {
                "title": "Standup",
                "description": "",
                "tag": "Work",
                "status": "pending",
                "start_ts": "2025-10-23T19:45:00Z",
                "end_ts": null
            },
            "last_error": "WA error 400"
        }))
        .unwrap();

        assert_eq!(payload.lang_code(), "es_MX");
        assert_eq!(payload.task_snapshot.title.as_deref(), Some("Standup"));
        assert_eq!(payload.task_snapshot.end_ts, None);
        assert!(payload.is_supported_mode());
        assert_eq!(payload.button_param(), None);
    }

    #[test]
    fn test_defaults_for_missing_hints() {
        let payload = ReminderPayload::from_json(&json!({})).unwrap();
        assert_eq!(payload.template_name(), DEFAULT_TEMPLATE_NAME);
        assert_eq!(payload.lang_code(), DEFAULT_LANG_CODE);
        assert_eq!(payload.task_snapshot, TaskSnapshot::default());

        let empty_name = ReminderPayload::from_json(&json!({"template_name": ""})).unwrap();
        assert_eq!(empty_name.template_name(), DEFAULT_TEMPLATE_NAME);
    }

    #[test]
    fn test_null_payload_is_default() {
        assert_eq!(
            ReminderPayload::from_json(&Value::Null).unwrap(),
            ReminderPayload::default()
        );
    }

    #[test]
    fn test_non_object_payload_is_an_error() {
        assert!(ReminderPayload::from_json(&json!(["not", "an", "object"])).is_err());
        assert!(ReminderPayload::from_json(&json!("text")).is_err());
    }

    #[test]
    fn test_wrong_scalar_types_are_stringified() {
        let payload = ReminderPayload::from_json(&json!({
            "header_hint": 15,
            "task_snapshot": {"title": 42, "tag": true}
        }))
        .unwrap();
        assert_eq!(payload.header_hint.as_deref(), Some("15"));
        assert_eq!(payload.task_snapshot.title.as_deref(), Some("42"));
        assert_eq!(payload.task_snapshot.tag.as_deref(), Some("true"));
    }

    #[test]
    fn test_malformed_snapshot_degrades_to_default() {
        let payload = ReminderPayload::from_json(&json!({"task_snapshot": "oops"})).unwrap();
        assert_eq!(payload.task_snapshot, TaskSnapshot::default());
    }

    #[test]
    fn test_unsupported_mode() {
        let payload = ReminderPayload::from_json(&json!({"mode": "free_text"})).unwrap();
        assert!(!payload.is_supported_mode());
    }

    #[test]
    fn test_button_param_requires_flag_and_text() {
        let with = ReminderPayload::from_json(&json!({
            "include_button": true,
            "button_param_text": "3d4ac02c"
        }))
        .unwrap();
        assert_eq!(with.button_param(), Some("3d4ac02c"));

        let flag_only = ReminderPayload::from_json(&json!({
            "include_button": true,
            "button_param_text": ""
        }))
        .unwrap();
        assert_eq!(flag_only.button_param(), None);
    }
}
