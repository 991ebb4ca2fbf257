use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Telecare";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
/// Sliding idle timeout for login sessions: 15 minutes.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 900;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_ADVISORY_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Cannot determine home directory; set TELECARE_DB_PATH")]
    NoHomeDir,
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,telecare_lib=debug"
    } else {
        "info"
    }
}

/// Get the application data directory (~/Telecare/)
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Runtime configuration, read from the process environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub session_idle_secs: u64,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub advisory_timeout_secs: u64,
    pub seed_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("TELECARE_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                var: "TELECARE_BIND",
                value: bind_raw.clone(),
            })?;

        let db_path = match get("TELECARE_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => app_data_dir()?.join("telecare.db"),
        };

        Ok(Self {
            bind_addr,
            db_path,
            session_idle_secs: parse_secs(
                "TELECARE_SESSION_IDLE_SECS",
                get("TELECARE_SESSION_IDLE_SECS"),
                DEFAULT_SESSION_IDLE_SECS,
            )?,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            advisory_timeout_secs: parse_secs(
                "TELECARE_ADVISORY_TIMEOUT_SECS",
                get("TELECARE_ADVISORY_TIMEOUT_SECS"),
                DEFAULT_ADVISORY_TIMEOUT_SECS,
            )?,
            seed_path: get("TELECARE_SEED").map(PathBuf::from),
        })
    }
}

fn parse_secs(var: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidValue { var, value }),
    }
}
