//! # taskminder-entity
//!
//! Domain entities persisted by Taskminder: scheduled WhatsApp reminder
//! jobs and the contact profile used to address them.

pub mod notification;
pub mod profile;
