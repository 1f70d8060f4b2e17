//! Contact profile entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The part of a user's profile the dispatcher reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactProfile {
    /// User id (same as the auth identity).
    pub id: Uuid,
    /// E.164 phone number without `+`.
    pub phone: Option<String>,
    /// Reminder opt-in flag.
    pub notify_enabled: Option<bool>,
}

impl ContactProfile {
    /// The phone number to deliver to, if the user opted in and has one.
    pub fn deliverable_phone(&self) -> Option<&str> {
        if !self.notify_enabled.unwrap_or(false) {
            return None;
        }
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
    }
}
