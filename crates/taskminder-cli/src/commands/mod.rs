//! CLI command definitions and dispatch.

pub mod cancel;
pub mod enqueue;
pub mod list;
pub mod migrate;
pub mod status;

use clap::{Parser, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use crate::output::OutputFormat;
use taskminder_core::config::AppConfig;
use taskminder_core::error::AppError;
use taskminder_database::DatabasePool;

/// Taskminder reminder operations
#[derive(Debug, Parser)]
#[command(name = "taskminder", version, about, long_about = None)]
pub struct Cli {
    /// Path to the base configuration file (extension optional)
    #[arg(short, long, env = "TASKMINDER_CONFIG", default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>`
    #[arg(short, long, env = "TASKMINDER_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run pending database migrations
    Migrate,
    /// Show notification counts per status
    Status,
    /// List recent notifications
    List(list::ListArgs),
    /// Schedule a WhatsApp reminder for a task
    Enqueue(enqueue::EnqueueArgs),
    /// Cancel a scheduled reminder that is not being delivered
    Cancel {
        /// Notification ID
        id: Uuid,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.load_config()?;
        let pool = create_db_pool(&config).await?;

        let result = match &self.command {
            Commands::Migrate => migrate::execute(&pool).await,
            Commands::Status => status::execute(&pool, self.format).await,
            Commands::List(args) => list::execute(args, &pool, self.format).await,
            Commands::Enqueue(args) => enqueue::execute(args, &pool, self.format).await,
            Commands::Cancel { id } => cancel::execute(*id, &pool, self.format).await,
        };

        pool.close().await;
        result
    }

    fn load_config(&self) -> Result<AppConfig, AppError> {
        AppConfig::load(&self.config, &self.env)
    }
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<PgPool, AppError> {
    let pool = DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}
