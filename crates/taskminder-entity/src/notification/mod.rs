//! Reminder notification jobs.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{CreateNotificationJob, NotificationJob};
pub use payload::{ReminderPayload, TaskSnapshot};
pub use status::{Channel, JobStatus};
