//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use spot_db::DbConfig;

use crate::retry::{BackoffStrategy, RetryPolicy};

/// Default tracing filter when neither `RUST_LOG` nor `SPOT_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,spot=debug,sqlx=warn";

/// Upper bound on a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Spot Commerce service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub max_connections: u32,

    /// How long a statement waits on another writer's lock (ms)
    pub busy_timeout_ms: u64,

    /// Total attempts for an operation that keeps failing with Transient
    pub checkout_max_attempts: u32,

    /// First backoff delay (ms); doubled per attempt
    pub retry_backoff_ms: u64,

    /// Re-check stock when a cart line quantity is updated
    pub validate_stock_on_update: bool,

    /// Default tracing filter
    pub log_filter: String,
}

impl ShopConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ShopConfig::default();

        let config = ShopConfig {
            database_path: lookup("SPOT_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            max_connections: parse_or(&lookup, "SPOT_MAX_CONNECTIONS", defaults.max_connections)?,

            busy_timeout_ms: parse_or(&lookup, "SPOT_BUSY_TIMEOUT_MS", defaults.busy_timeout_ms)?,

            checkout_max_attempts: parse_or(
                &lookup,
                "SPOT_CHECKOUT_MAX_ATTEMPTS",
                defaults.checkout_max_attempts,
            )?,

            retry_backoff_ms: parse_or(
                &lookup,
                "SPOT_RETRY_BACKOFF_MS",
                defaults.retry_backoff_ms,
            )?,

            validate_stock_on_update: parse_or(
                &lookup,
                "SPOT_VALIDATE_STOCK_ON_UPDATE",
                defaults.validate_stock_on_update,
            )?,

            log_filter: lookup("SPOT_LOG").unwrap_or(defaults.log_filter),
        };

        config.validate()?;
        Ok(config)
    }

    /// Defaults with a specific database file.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        ShopConfig {
            database_path: path.into(),
            ..ShopConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("SPOT_MAX_CONNECTIONS".to_string()));
        }
        if self.checkout_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("SPOT_CHECKOUT_MAX_ATTEMPTS".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("SPOT_DATABASE_PATH".to_string()));
        }
        Ok(())
    }

    /// Pool settings for spot-db. Migrations always run on connect.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let backoff = if self.retry_backoff_ms == 0 {
            BackoffStrategy::None
        } else {
            BackoffStrategy::Exponential {
                base: Duration::from_millis(self.retry_backoff_ms),
                max: MAX_BACKOFF,
            }
        };

        RetryPolicy::new(self.checkout_max_attempts).with_backoff(backoff)
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            database_path: PathBuf::from("./spot.db"),
            max_connections: 5,
            busy_timeout_ms: 5000,
            checkout_max_attempts: 3,
            retry_backoff_ms: 25,
            validate_stock_on_update: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
