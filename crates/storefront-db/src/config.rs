//! Environment-driven database configuration.
//!
//! | Variable                               | Default         |
//! |----------------------------------------|-----------------|
//! | `STOREFRONT_DB_PATH`                   | `storefront.db` |
//! | `STOREFRONT_DB_MAX_CONNECTIONS`        | `8`             |
//! | `STOREFRONT_DB_CONNECT_TIMEOUT_SECS`   | `30`            |
//! | `STOREFRONT_DB_BUSY_TIMEOUT_SECS`      | `5`             |
//!
//! `STOREFRONT_DB_PATH=:memory:` selects an in-memory database.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::pool::DbConfig;

pub const ENV_DB_PATH: &str = "STOREFRONT_DB_PATH";
pub const ENV_MAX_CONNECTIONS: &str = "STOREFRONT_DB_MAX_CONNECTIONS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "STOREFRONT_DB_CONNECT_TIMEOUT_SECS";
pub const ENV_BUSY_TIMEOUT_SECS: &str = "STOREFRONT_DB_BUSY_TIMEOUT_SECS";

const DEFAULT_DB_PATH: &str = "storefront.db";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

impl DbConfig {
    /// Loads configuration from environment variables with fallback to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(ENV_DB_PATH).unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let mut config = if path.trim() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(path)
        };

        if let Some(max) = parse::<u32>(&lookup, ENV_MAX_CONNECTIONS)? {
            if max == 0 {
                return Err(ConfigError::InvalidValue(ENV_MAX_CONNECTIONS.to_string()));
            }
            config = config.max_connections(max);
        }

        if let Some(secs) = parse::<u64>(&lookup, ENV_CONNECT_TIMEOUT_SECS)? {
            config = config.connect_timeout(Duration::from_secs(secs));
        }

        if let Some(secs) = parse::<u64>(&lookup, ENV_BUSY_TIMEOUT_SECS)? {
            config = config.busy_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DbConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path.to_str(), Some(DEFAULT_DB_PATH));
        assert_eq!(config.max_connections, 8);
    }

    #[test]
    fn test_overrides() {
        let config = DbConfig::from_lookup(lookup(&[
            (ENV_DB_PATH, "/data/shop.db"),
            (ENV_MAX_CONNECTIONS, "16"),
            (ENV_CONNECT_TIMEOUT_SECS, "3"),
            (ENV_BUSY_TIMEOUT_SECS, "2"),
        ]))
        .unwrap();

        assert_eq!(config.database_path.to_str(), Some("/data/shop.db"));
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.busy_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_in_memory_path() {
        let config = DbConfig::from_lookup(lookup(&[(ENV_DB_PATH, ":memory:")])).unwrap();
        assert!(config.is_in_memory());
    }

    #[test]
    fn test_invalid_values() {
        let err = DbConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "many")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for STOREFRONT_DB_MAX_CONNECTIONS");

        assert!(DbConfig::from_lookup(lookup(&[(ENV_MAX_CONNECTIONS, "0")])).is_err());
    }
}
