//! Delivery error taxonomy.

/// A send that the gateway did not complete.
///
/// All variants count as a delivery attempt for retry purposes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The provider answered with a non-success status.
    #[error("WA error {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Provider error message, or the raw body.
        message: String,
    },

    /// No response within the request timeout.
    #[error("WA request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure.
    #[error("WA transport error: {0}")]
    Transport(String),

    /// A success status with a body that is not JSON.
    #[error("WA invalid response: {0}")]
    InvalidResponse(String),

    /// Missing credentials.
    #[error("WA not configured: {0}")]
    NotConfigured(String),
}
