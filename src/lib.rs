pub mod advisory;
pub mod api;
pub mod auth;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod seed;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Anything that stops the service from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Cannot create data directory {path}: {source}")]
    DataDir {
        path: String,
        source: std::io::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Seed import failed: {0}")]
    Seed(#[from] seed::SeedError),
    #[error("Advisory client error: {0}")]
    Advisory(#[from] advisory::AdvisoryError),
    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),
}

pub async fn run() -> Result<(), StartupError> {
    // A missing .env is normal; real environment variables win.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let cfg = config::ServerConfig::from_env()?;

    if let Some(parent) = cfg.db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StartupError::DataDir {
            path: parent.display().to_string(),
            source,
        })?;
    }

    // Opening once runs migrations; requests open their own connections.
    let mut conn = db::open_database(&cfg.db_path)?;
    tracing::info!(path = %cfg.db_path.display(), "Database ready");

    if let Some(seed_path) = &cfg.seed_path {
        seed::import_seed_file(&mut conn, seed_path)?;
    }
    drop(conn);

    let advisor = advisory::client_from_config(&cfg)?;
    let core = Arc::new(core_state::CoreState::new(
        cfg.db_path.clone(),
        Duration::from_secs(cfg.session_idle_secs),
        advisor,
    ));

    let mut server = api::start_server(core, cfg.bind_addr).await?;
    tracing::info!(addr = %server.local_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.wait().await;
    Ok(())
}
