//! Environment-backed configuration.
//!
//! Everything except the database URL has a default. Override with `RANKBOARD_*`
//! environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheKind;
use crate::constants::{
    DEFAULT_SIMULATED_UPDATES, DEFAULT_SYNC_BATCH_SIZE, DEFAULT_UPDATE_QUEUE_CAPACITY,
    DEFAULT_UPDATE_WORKERS, MAX_SIMULATED_UPDATES,
};
use crate::pipeline::PipelineConfig;

/// Default Redis URL used when `RANKBOARD_REDIS_URL` is not set.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Postgres connection string. Required.
    pub database_url: String,

    /// Max pooled Postgres connections. Default: `16`.
    pub db_pool_size: usize,

    /// Which rank cache to run. Default: `redis`.
    pub cache_backend: CacheKind,

    /// Redis endpoint. Default: `redis://127.0.0.1:6379`.
    pub redis_url: String,

    /// Update pipeline workers. Default: `5`.
    pub update_workers: usize,

    /// Update queue capacity. Default: `100`.
    pub update_queue_capacity: usize,

    /// Members written per cache round trip during a sync. Default: `1000`.
    pub sync_batch_size: usize,

    /// Seconds between background resyncs; `0` disables. Default: `0`.
    pub resync_interval_secs: u64,

    /// Seconds between simulated update batches; `0` disables. Default: `0`.
    pub simulate_interval_secs: u64,

    /// Updates per simulated batch. Default: `10`.
    pub simulate_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            database_url: String::new(),
            db_pool_size: 16,
            cache_backend: CacheKind::default(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            update_workers: DEFAULT_UPDATE_WORKERS,
            update_queue_capacity: DEFAULT_UPDATE_QUEUE_CAPACITY,
            sync_batch_size: DEFAULT_SYNC_BATCH_SIZE,
            resync_interval_secs: 0,
            simulate_interval_secs: 0,
            simulate_count: DEFAULT_SIMULATED_UPDATES,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "RANKBOARD_PORT";
    const ENV_BIND_ADDR: &'static str = "RANKBOARD_BIND_ADDR";
    const ENV_DATABASE_URL: &'static str = "RANKBOARD_DATABASE_URL";
    const ENV_DB_POOL_SIZE: &'static str = "RANKBOARD_DB_POOL_SIZE";
    const ENV_CACHE_BACKEND: &'static str = "RANKBOARD_CACHE_BACKEND";
    const ENV_REDIS_URL: &'static str = "RANKBOARD_REDIS_URL";
    const ENV_UPDATE_WORKERS: &'static str = "RANKBOARD_UPDATE_WORKERS";
    const ENV_UPDATE_QUEUE_CAPACITY: &'static str = "RANKBOARD_UPDATE_QUEUE_CAPACITY";
    const ENV_SYNC_BATCH_SIZE: &'static str = "RANKBOARD_SYNC_BATCH_SIZE";
    const ENV_RESYNC_INTERVAL_SECS: &'static str = "RANKBOARD_RESYNC_INTERVAL_SECS";
    const ENV_SIMULATE_INTERVAL_SECS: &'static str = "RANKBOARD_SIMULATE_INTERVAL_SECS";
    const ENV_SIMULATE_COUNT: &'static str = "RANKBOARD_SIMULATE_COUNT";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let database_url = Self::required_string_from_env(Self::ENV_DATABASE_URL)?;
        let db_pool_size = Self::parse_from_env(Self::ENV_DB_POOL_SIZE, defaults.db_pool_size)?;
        let cache_backend =
            Self::parse_from_env(Self::ENV_CACHE_BACKEND, defaults.cache_backend)?;
        let redis_url = Self::parse_string_from_env(Self::ENV_REDIS_URL, defaults.redis_url);
        let update_workers =
            Self::parse_from_env(Self::ENV_UPDATE_WORKERS, defaults.update_workers)?;
        let update_queue_capacity = Self::parse_from_env(
            Self::ENV_UPDATE_QUEUE_CAPACITY,
            defaults.update_queue_capacity,
        )?;
        let sync_batch_size =
            Self::parse_from_env(Self::ENV_SYNC_BATCH_SIZE, defaults.sync_batch_size)?;
        let resync_interval_secs = Self::parse_from_env(
            Self::ENV_RESYNC_INTERVAL_SECS,
            defaults.resync_interval_secs,
        )?;
        let simulate_interval_secs = Self::parse_from_env(
            Self::ENV_SIMULATE_INTERVAL_SECS,
            defaults.simulate_interval_secs,
        )?;
        let simulate_count =
            Self::parse_from_env(Self::ENV_SIMULATE_COUNT, defaults.simulate_count)?;

        Ok(Self {
            port,
            bind_addr,
            database_url,
            db_pool_size,
            cache_backend,
            redis_url,
            update_workers,
            update_queue_capacity,
            sync_batch_size,
            resync_interval_secs,
            simulate_interval_secs,
            simulate_count,
        })
    }

    /// Checks sizing invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                name: Self::ENV_DATABASE_URL,
            });
        }

        let non_zero = [
            (Self::ENV_DB_POOL_SIZE, self.db_pool_size),
            (Self::ENV_UPDATE_WORKERS, self.update_workers),
            (Self::ENV_UPDATE_QUEUE_CAPACITY, self.update_queue_capacity),
            (Self::ENV_SYNC_BATCH_SIZE, self.sync_batch_size),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    value: value.to_string(),
                    expected: "at least 1",
                });
            }
        }

        if !(1..=MAX_SIMULATED_UPDATES).contains(&self.simulate_count) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_SIMULATE_COUNT,
                value: self.simulate_count.to_string(),
                expected: "between 1 and 100",
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new(self.update_workers, self.update_queue_capacity)
    }

    pub fn resync_interval(&self) -> Option<Duration> {
        (self.resync_interval_secs > 0).then(|| Duration::from_secs(self.resync_interval_secs))
    }

    pub fn simulate_interval(&self) -> Option<Duration> {
        (self.simulate_interval_secs > 0)
            .then(|| Duration::from_secs(self.simulate_interval_secs))
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn required_string_from_env(name: &'static str) -> Result<String, ConfigError> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingEnvVar { name })
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name,
                    value,
                    message: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }
}
