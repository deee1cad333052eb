use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Server configuration from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub database_url: String,
    /// Deadline for one unit of work. `None` means no deadline.
    pub transaction_timeout: Option<Duration>,
    pub outbox_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    /// DATABASE_URL defaults to "sqlite://players.db"
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://players.db".to_string());

        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("LISTEN_ADDR", "must be a valid socket address"))?;

        let transaction_timeout = match lookup("PLAYERS_TX_TIMEOUT_MS") {
            Some(ms) if !ms.trim().is_empty() => {
                let ms: u64 = ms.trim().parse().map_err(|_| {
                    ConfigError::Invalid("PLAYERS_TX_TIMEOUT_MS", "must be a whole number of milliseconds")
                })?;
                if ms == 0 {
                    return Err(ConfigError::Invalid(
                        "PLAYERS_TX_TIMEOUT_MS",
                        "must be greater than zero",
                    ));
                }
                Some(Duration::from_millis(ms))
            }
            _ => None,
        };

        let outbox_enabled = match lookup("PLAYERS_OUTBOX_ENABLED") {
            Some(flag) => match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid(
                        "PLAYERS_OUTBOX_ENABLED",
                        "must be true or false",
                    ))
                }
            },
            None => true,
        };

        Ok(Config {
            listen_addr,
            database_url,
            transaction_timeout,
            outbox_enabled,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.database_url, "sqlite://players.db");
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.transaction_timeout, None);
        assert!(config.outbox_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("PLAYERS_TX_TIMEOUT_MS", "1500"),
            ("PLAYERS_OUTBOX_ENABLED", "off"),
        ])
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.transaction_timeout, Some(Duration::from_millis(1500)));
        assert!(!config.outbox_enabled);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = load(&[("LISTEN_ADDR", "nowhere")]).unwrap_err();
        assert!(err.to_string().contains("LISTEN_ADDR"));

        let err = load(&[("PLAYERS_TX_TIMEOUT_MS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("PLAYERS_TX_TIMEOUT_MS"));

        let err = load(&[("PLAYERS_TX_TIMEOUT_MS", "0")]).unwrap_err();
        assert!(err.to_string().contains("PLAYERS_TX_TIMEOUT_MS"));

        let err = load(&[("PLAYERS_OUTBOX_ENABLED", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("PLAYERS_OUTBOX_ENABLED"));
    }
}
