//! Dispatch loop configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::result::AppResult;

/// How the dispatcher takes ownership of due notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimMode {
    /// Single server-side select-and-flip. Safe with any number of workers.
    #[default]
    Atomic,
    /// Select, then flip `processing` in a second round-trip.
    /// Two workers can claim the same row; single-worker deployments only.
    Fallback,
}

/// Reminder dispatch loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Seconds to sleep after an empty claim.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum notifications claimed per poll.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Delivery attempts before a notification is marked failed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Pause between two non-empty batches, in milliseconds.
    #[serde(default = "default_batch_pause")]
    pub batch_pause_millis: u64,
    /// Claim strategy.
    #[serde(default)]
    pub claim_mode: ClaimMode,
    /// Identifier used in logs. Derived from host and pid when unset.
    #[serde(default)]
    pub worker_id: Option<String>,
}

impl DispatcherConfig {
    /// Reject non-positive knobs and batch sizes the claim query cannot take.
    pub fn validate(&self) -> AppResult<()> {
        if self.poll_interval_seconds == 0 {
            return Err(AppError::configuration(
                "dispatcher.poll_interval_seconds must be positive",
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::configuration(
                "dispatcher.batch_size must be positive",
            ));
        }
        if i32::try_from(self.batch_size).is_err() {
            return Err(AppError::configuration(format!(
                "dispatcher.batch_size must be at most {}",
                i32::MAX
            )));
        }
        if self.max_attempts <= 0 {
            return Err(AppError::configuration(
                "dispatcher.max_attempts must be positive",
            ));
        }
        Ok(())
    }

    /// The configured worker id, or `<host>-<pid>`.
    pub fn resolved_worker_id(&self) -> String {
        match &self.worker_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => {
                let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "worker".to_string());
                format!("{}-{}", host, std::process::id())
            }
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            batch_pause_millis: default_batch_pause(),
            claim_mode: ClaimMode::default(),
            worker_id: None,
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

fn default_batch_size() -> u32 {
    20
}

fn default_max_attempts() -> i32 {
    5
}

fn default_batch_pause() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_worker_id_wins() {
        let cfg = DispatcherConfig {
            worker_id: Some("dispatcher-a".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.resolved_worker_id(), "dispatcher-a");
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(DispatcherConfig::default().validate().is_ok());

        for batch_size in [0, i32::MAX as u32 + 1, u32::MAX] {
            let cfg = DispatcherConfig {
                batch_size,
                ..Default::default()
            };
            let err = cfg.validate().unwrap_err();
            assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
        }

        let cfg = DispatcherConfig {
            batch_size: i32::MAX as u32,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_derived_worker_id_has_pid() {
        let cfg = DispatcherConfig::default();
        let id = cfg.resolved_worker_id();
        assert!(id.ends_with(&std::process::id().to_string()));
    }
}
