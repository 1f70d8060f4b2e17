//! Reminder dispatch for Taskminder.
//!
//! This crate provides:
//! - A job claimer that takes ownership of due notifications
//! - A template renderer for the positional reminder template
//! - A delivery attempt handler that sends one notification and applies
//!   the sent / retry-with-backoff / failed transition
//! - The dispatch loop that ties them together

pub mod backoff;
pub mod claimer;
pub mod dispatcher;
pub mod handler;
pub mod template;

pub use claimer::JobClaimer;
pub use dispatcher::{BatchReport, DispatchLoop};
pub use handler::{AttemptOutcome, DeliveryAttemptHandler};
