use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Service settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Absent selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Absent disables Kafka publishing.
    pub kafka_brokers: Option<String>,
    pub kafka_topic: String,
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            database_max_connections: 5,
            kafka_brokers: None,
            kafka_topic: "auction-events".to_string(),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // a zero period would stop the auction sweeper
        let sweep_secs: u64 = try_load(
            &lookup,
            "AUCTION_SWEEP_INTERVAL_SECS",
            defaults.sweep_interval.as_secs(),
        )?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "AUCTION_SWEEP_INTERVAL_SECS",
                value: sweep_secs.to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            port: try_load(&lookup, "PORT", defaults.port)?,
            database_url: optional("DATABASE_URL"),
            database_max_connections: try_load(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            kafka_brokers: optional("KAFKA_BROKERS"),
            kafka_topic: optional("KAFKA_TOPIC").unwrap_or(defaults.kafka_topic),
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        None => {
            info!("{:<12} --> {} not set, using default: {}", "Config", key, default);
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_run_without_database_or_kafka() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
        assert!(config.kafka_brokers.is_none());
        assert_eq!(config.kafka_topic, "auction-events");
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/market"),
            ("KAFKA_BROKERS", "localhost:9092"),
            ("AUCTION_SWEEP_INTERVAL_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/market")
        );
        assert_eq!(config.kafka_brokers.as_deref(), Some("localhost:9092"));
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let err = Config::from_lookup(lookup(&[("AUCTION_SWEEP_INTERVAL_SECS", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "AUCTION_SWEEP_INTERVAL_SECS",
                ..
            }
        ));
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert!(config.database_url.is_none());
    }
}
