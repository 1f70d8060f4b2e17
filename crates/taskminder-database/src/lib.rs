//! # taskminder-database
//!
//! Persistence for reminder notifications. The dispatcher talks to the
//! [`store::NotificationStore`] and [`store::ProfileStore`] seams; this
//! crate provides the PostgreSQL implementations plus an in-memory store
//! for single-process runs and tests.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use repositories::notification::NotificationRepository;
pub use repositories::profile::ProfileRepository;
pub use store::{MemoryNotificationStore, MemoryProfileStore, NotificationStore, ProfileStore};
