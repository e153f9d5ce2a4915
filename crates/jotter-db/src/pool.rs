//! Connection pool setup.
//!
//! Pool sizing comes from [`PoolConfig`], which starts from conservative
//! defaults for a single-service deployment and accepts overrides from the
//! environment. `Database::connect` goes through [`create_pool`], so the
//! env overrides apply on every startup path.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use jotter_core::{Error, Result};

/// Pool sizing and timeout settings.
///
/// Environment overrides: `DB_MAX_CONNECTIONS`, `DB_MIN_CONNECTIONS`,
/// `DB_ACQUIRE_TIMEOUT_SECS`, `DB_IDLE_TIMEOUT_SECS`. Unset or unparseable
/// values keep the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl PoolConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            max_connections: env_or("DB_MAX_CONNECTIONS", base.max_connections),
            min_connections: env_or("DB_MIN_CONNECTIONS", base.min_connections),
            acquire_timeout: Duration::from_secs(env_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                base.acquire_timeout.as_secs(),
            )),
            idle_timeout: Duration::from_secs(env_or(
                "DB_IDLE_TIMEOUT_SECS",
                base.idle_timeout.as_secs(),
            )),
        }
    }
}

/// Parse an environment variable, keeping `default` when the variable is
/// absent or fails to parse.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Connect with environment-derived pool settings.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::from_env()).await
}

/// Connect with explicit pool settings.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        pool_size = pool.size(),
        "Connection pool established"
    );
    Ok(pool)
}
