//! Messaging gateway trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DeliveryError;
use crate::message::TemplateMessage;

/// Sends pre-rendered template messages.
///
/// Implementations return the provider's delivery payload on success.
/// Every failure, including a request timeout, is a [`DeliveryError`].
#[async_trait]
pub trait MessagingGateway: Send + Sync + std::fmt::Debug {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Send one templated message.
    async fn send_template(&self, message: &TemplateMessage) -> Result<Value, DeliveryError>;
}
