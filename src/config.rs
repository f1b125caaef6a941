use std::env::var;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

use crate::{
    application::handlers::message_dispatcher::DispatcherConfig,
    infrastructure::messaging::webhook::WebhookConfig,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required env param {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for env param {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub scheme: String,
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// In-memory storage is used when unset.
    pub database: Option<DatabaseConfig>,
    pub redis_url: Option<String>,
    pub webhook: WebhookConfig,
    pub dispatcher: DispatcherConfig,
    pub autostart: bool,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|name| var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let interval_seconds: u64 = parse_or(&get, "DISPATCH_INTERVAL_SECONDS", 120)?;
        let batch_size: u32 = parse_or(&get, "DISPATCH_BATCH_SIZE", 2)?;
        if interval_seconds == 0 {
            return Err(invalid("DISPATCH_INTERVAL_SECONDS", "0"));
        }
        if batch_size == 0 {
            return Err(invalid("DISPATCH_BATCH_SIZE", "0"));
        }

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            }),
            None => None,
        };

        Ok(Config {
            server: ServerConfig {
                port: parse_or(&get, "PORT", 8080)?,
                scheme: get("SCHEME").unwrap_or_else(|| "http".to_string()),
                host: get("HOST").unwrap_or_else(|| "localhost".to_string()),
            },
            database,
            redis_url: get("REDIS_URL"),
            webhook: WebhookConfig {
                url: get("WEBHOOK_URL").ok_or(ConfigError::Missing("WEBHOOK_URL"))?,
                auth_key: get("WEBHOOK_AUTH_KEY").unwrap_or_default(),
                timeout: Duration::from_secs(parse_or(&get, "WEBHOOK_TIMEOUT_SECONDS", 10)?),
            },
            dispatcher: DispatcherConfig {
                batch_size,
                interval: Duration::from_secs(interval_seconds),
            },
            autostart: parse_bool(&get, "DISPATCH_AUTOSTART", false)?,
            log_level: parse_or(&get, "LOG_LEVEL", tracing::Level::INFO)?,
        })
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value.trim().parse().map_err(|_| invalid(name, &value)),
        None => Ok(default),
    }
}

fn parse_bool(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(name, &value)),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_webhook_is_set() {
        let config = parse(&[("WEBHOOK_URL", "http://hooks.local/send")]).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "localhost");
        assert!(config.database.is_none());
        assert!(config.redis_url.is_none());
        assert_eq!(config.webhook.auth_key, "");
        assert_eq!(config.dispatcher.batch_size, 2);
        assert_eq!(config.dispatcher.interval, Duration::from_secs(120));
        assert!(!config.autostart);
        assert_eq!(config.log_level, tracing::Level::INFO);
    }

    #[test]
    fn webhook_url_is_required() {
        assert_eq!(
            parse(&[("PORT", "9000")]).unwrap_err(),
            ConfigError::Missing("WEBHOOK_URL")
        );
        assert_eq!(
            parse(&[("WEBHOOK_URL", "  ")]).unwrap_err(),
            ConfigError::Missing("WEBHOOK_URL")
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = parse(&[
            ("WEBHOOK_URL", "http://hooks.local/send"),
            ("WEBHOOK_AUTH_KEY", "secret"),
            ("DATABASE_URL", "postgres://localhost/messages"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("REDIS_URL", "redis://localhost:6379/0"),
            ("DISPATCH_BATCH_SIZE", "10"),
            ("DISPATCH_INTERVAL_SECONDS", "30"),
            ("DISPATCH_AUTOSTART", "true"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.max_connections, 12);
        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379/0"));
        assert_eq!(config.webhook.auth_key, "secret");
        assert_eq!(config.dispatcher.batch_size, 10);
        assert_eq!(config.dispatcher.interval, Duration::from_secs(30));
        assert!(config.autostart);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = parse(&[("WEBHOOK_URL", "http://x"), ("PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn zero_batch_or_interval_is_rejected() {
        assert!(parse(&[("WEBHOOK_URL", "http://x"), ("DISPATCH_BATCH_SIZE", "0")]).is_err());
        assert!(
            parse(&[("WEBHOOK_URL", "http://x"), ("DISPATCH_INTERVAL_SECONDS", "0")]).is_err()
        );
    }
}
