//! Taskminder reminder dispatcher.
//!
//! Wires the database, the WhatsApp gateway and the dispatch loop together
//! and runs until Ctrl+C or SIGTERM.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use taskminder_core::config::AppConfig;
use taskminder_core::error::AppError;
use taskminder_database::{
    DatabasePool, NotificationRepository, NotificationStore, ProfileRepository, ProfileStore,
};
use taskminder_messaging::{MessagingGateway, WhatsAppClient};
use taskminder_worker::{DeliveryAttemptHandler, DispatchLoop, JobClaimer};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Dispatcher error");
        std::process::exit(1);
    }
}

/// Load and validate configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("TASKMINDER_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("TASKMINDER_ENV").unwrap_or_else(|_| "development".to_string());

    let config = AppConfig::load(&config_path, &env)?;
    config.validate()?;
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main dispatcher run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Taskminder dispatcher v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;
    taskminder_database::migration::run_migrations(db.pool()).await?;

    let notifications: Arc<dyn NotificationStore> =
        Arc::new(NotificationRepository::new(db.pool().clone()));
    let profiles: Arc<dyn ProfileStore> = Arc::new(ProfileRepository::new(db.pool().clone()));
    let gateway: Arc<dyn MessagingGateway> =
        Arc::new(WhatsAppClient::new(config.whatsapp.clone())?);

    let claimer = JobClaimer::new(
        Arc::clone(&notifications),
        config.dispatcher.claim_mode,
        config.dispatcher.batch_size,
    );
    let handler = DeliveryAttemptHandler::new(
        notifications,
        profiles,
        gateway,
        config.dispatcher.max_attempts,
    );
    let dispatcher = DispatchLoop::new(claimer, handler, &config.dispatcher);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, finishing current job...");
        let _ = shutdown_tx.send(true);
    });

    dispatcher.run(shutdown_rx).await;

    db.close().await;
    tracing::info!("Taskminder dispatcher shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
