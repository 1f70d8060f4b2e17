//! PostgreSQL repository implementations.

pub mod notification;
pub mod profile;
