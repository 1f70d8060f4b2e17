//! Database migration command.

use sqlx::PgPool;

use crate::output;
use taskminder_core::error::AppError;

/// Apply all pending migrations
pub async fn execute(pool: &PgPool) -> Result<(), AppError> {
    println!("Running database migrations...");
    taskminder_database::migration::run_migrations(pool).await?;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
