//! # taskminder-core
//!
//! Core crate for the Taskminder reminder dispatcher. Contains the
//! configuration schemas and the unified error system shared by every
//! other crate in the workspace.
//!
//! This crate has **no** internal dependencies on other Taskminder crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
