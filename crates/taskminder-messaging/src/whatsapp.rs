//! WhatsApp Cloud API client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use taskminder_core::config::WhatsAppConfig;
use taskminder_core::error::{AppError, ErrorKind};
use taskminder_core::result::AppResult;

use crate::error::DeliveryError;
use crate::gateway::MessagingGateway;
use crate::message::TemplateMessage;

/// Sends template messages through `/{phone_number_id}/messages`.
pub struct WhatsAppClient {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for WhatsAppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppClient")
            .field("api_base_url", &self.config.api_base_url)
            .field("api_version", &self.config.api_version)
            .field("phone_number_id", &self.config.phone_number_id)
            .finish()
    }
}

impl WhatsAppClient {
    /// Create a client whose requests time out after
    /// `request_timeout_seconds`.
    pub fn new(config: WhatsAppConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build WhatsApp HTTP client",
                    e,
                )
            })?;
        Ok(Self { config, client })
    }

    /// Full URL of the messages endpoint.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.api_version.trim_matches('/'),
            self.config.phone_number_id
        )
    }

    fn map_send_error(err: reqwest::Error) -> DeliveryError {
        if err.is_timeout() {
            DeliveryError::Timeout(err.to_string())
        } else {
            DeliveryError::Transport(err.to_string())
        }
    }
}

/// Extract the Graph API error message from an error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl MessagingGateway for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send_template(&self, message: &TemplateMessage) -> Result<Value, DeliveryError> {
        if self.config.phone_number_id.is_empty() || self.config.access_token.is_empty() {
            return Err(DeliveryError::NotConfigured(
                "phone_number_id or access_token missing".to_string(),
            ));
        }

        let url = self.messages_url();
        debug!(
            template = %message.template_name,
            lang = %message.lang_code,
            "Sending WhatsApp template"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&message.to_request_body())
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                DeliveryError::Timeout(e.to_string())
            } else {
                DeliveryError::InvalidResponse(e.to_string())
            }
        })
    }
}
