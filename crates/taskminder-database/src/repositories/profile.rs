//! Profile repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use taskminder_core::error::{AppError, ErrorKind};
use taskminder_core::result::AppResult;
use taskminder_entity::profile::ContactProfile;

use crate::store::ProfileStore;

/// Read-only access to the `profiles` table.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for ProfileRepository {
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<ContactProfile>> {
        sqlx::query_as::<_, ContactProfile>(
            "SELECT id, phone, notify_enabled FROM profiles WHERE id = $1 LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load profile", e))
    }
}
