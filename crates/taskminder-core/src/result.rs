//! Convenience result type alias for Taskminder.

use crate::error::AppError;

/// A specialized `Result` type for Taskminder operations.
pub type AppResult<T> = Result<T, AppError>;
