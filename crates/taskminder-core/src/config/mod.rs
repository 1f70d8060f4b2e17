//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod dispatcher;
pub mod logging;
pub mod whatsapp;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::dispatcher::{ClaimMode, DispatcherConfig};
pub use self::logging::LoggingConfig;
pub use self::whatsapp::WhatsAppConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Root application configuration.
///
/// Top-level deserialization target for the merged configuration
/// (base file + environment overlay + `TASKMINDER__*` variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Dispatch loop settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Merges the base file at `path` with the `config/{env}` overlay and
    /// environment variables prefixed with `TASKMINDER__`.
    pub fn load(path: &str, env: &str) -> AppResult<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TASKMINDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Check the settings the dispatcher cannot run without.
    pub fn validate(&self) -> AppResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must be set"));
        }
        self.dispatcher.validate()?;
        self.whatsapp.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = from_toml(
            r#"
            [database]
            url = "postgres://localhost/taskminder"

            [whatsapp]
            phone_number_id = "1234567890"
            access_token = "token"
            "#,
        );

        assert_eq!(cfg.dispatcher.poll_interval_seconds, 30);
        assert_eq!(cfg.dispatcher.batch_size, 20);
        assert_eq!(cfg.dispatcher.max_attempts, 5);
        assert_eq!(cfg.dispatcher.claim_mode, ClaimMode::Atomic);
        assert_eq!(cfg.whatsapp.api_version, "v19.0");
        assert_eq!(cfg.whatsapp.request_timeout_seconds, 30);
        assert_eq!(cfg.database.max_connections, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let cfg = from_toml(
            r#"
            [database]
            url = "postgres://localhost/taskminder"
            "#,
        );

        let err = cfg.validate().unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let cfg = from_toml(
            r#"
            [database]
            url = "postgres://localhost/taskminder"

            [dispatcher]
            batch_size = 0
            claim_mode = "fallback"

            [whatsapp]
            phone_number_id = "1234567890"
            access_token = "token"
            "#,
        );

        assert_eq!(cfg.dispatcher.claim_mode, ClaimMode::Fallback);
        assert!(cfg.validate().is_err());
    }
}
