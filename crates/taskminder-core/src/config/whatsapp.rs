//! WhatsApp Cloud API configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// Credentials and transport settings for the messaging gateway.
#[derive(Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Graph API base URL, without version.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Sending phone number id.
    #[serde(default)]
    pub phone_number_id: String,
    /// Bearer token for the Cloud API.
    #[serde(default)]
    pub access_token: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl WhatsAppConfig {
    /// Ensure credentials are present.
    pub fn validate(&self) -> AppResult<()> {
        if self.phone_number_id.trim().is_empty() || self.access_token.trim().is_empty() {
            return Err(AppError::configuration(
                "whatsapp.phone_number_id and whatsapp.access_token must be set",
            ));
        }
        if self.request_timeout_seconds == 0 {
            return Err(AppError::configuration(
                "whatsapp.request_timeout_seconds must be positive",
            ));
        }
        Ok(())
    }
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            phone_number_id: String::new(),
            access_token: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

// Keeps the access token out of logs.
impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &"****")
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v19.0".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_masks_token() {
        let cfg = WhatsAppConfig {
            access_token: "EAAG-secret".to_string(),
            ..Default::default()
        };
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("EAAG-secret"));
        assert!(rendered.contains("****"));
    }
}
