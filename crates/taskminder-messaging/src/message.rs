//! Positional template messages and their Cloud API wire form.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A template message with positional text parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMessage {
    /// Recipient in E.164 without `+`.
    pub to: String,
    /// Approved template name.
    pub template_name: String,
    /// Template language code.
    pub lang_code: String,
    /// Header `{{1}}..` values.
    pub header_params: Vec<String>,
    /// Body `{{1}}..` values.
    pub body_params: Vec<String>,
    /// URL button parameter values. Empty when the template has no
    /// dynamic button.
    pub button_params: Vec<String>,
}

impl TemplateMessage {
    /// Build the `POST /messages` request body.
    ///
    /// Components with no parameters are omitted.
    pub fn to_request_body(&self) -> Value {
        let mut components = Vec::new();
        if !self.header_params.is_empty() {
            components.push(json!({
                "type": "header",
                "parameters": text_parameters(&self.header_params),
            }));
        }
        if !self.body_params.is_empty() {
            components.push(json!({
                "type": "body",
                "parameters": text_parameters(&self.body_params),
            }));
        }
        if !self.button_params.is_empty() {
            components.push(json!({
                "type": "button",
                "sub_type": "url",
                "index": "0",
                "parameters": text_parameters(&self.button_params),
            }));
        }

        json!({
            "messaging_product": "whatsapp",
            "to": self.to,
            "type": "template",
            "template": {
                "name": self.template_name,
                "language": { "code": self.lang_code },
                "components": components,
            },
        })
    }
}

fn text_parameters(values: &[String]) -> Vec<Value> {
    values
        .iter()
        .map(|text| json!({ "type": "text", "text": text }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_orders_components() {
        let message = TemplateMessage {
            to: "5215551234567".to_string(),
            template_name: "rm_task_summary".to_string(),
            lang_code: "en".to_string(),
            header_params: vec!["15 min".to_string()],
            body_params: vec!["Standup".to_string(), "".to_string()],
            button_params: vec!["task-1".to_string()],
        };

        let body = message.to_request_body();
        assert_eq!(body["type"], "template");
        assert_eq!(body["template"]["language"]["code"], "en");

        let components = body["template"]["components"].as_array().unwrap();
        assert_eq!(components.len(), 3);
        assert_eq!(components[0]["type"], "header");
        assert_eq!(components[0]["parameters"][0]["text"], "15 min");
        assert_eq!(components[1]["parameters"][1]["text"], "");
        assert_eq!(components[2]["sub_type"], "url");
        assert_eq!(components[2]["index"], "0");
    }

    #[test]
    fn test_empty_components_omitted() {
        let message = TemplateMessage {
            to: "5215551234567".to_string(),
            template_name: "hello_world".to_string(),
            lang_code: "en_US".to_string(),
            header_params: vec![],
            body_params: vec![],
            button_params: vec![],
        };

        let body = message.to_request_body();
        assert!(body["template"]["components"].as_array().unwrap().is_empty());
    }
}
