//! Configuration loading and representation.
//!
//! Values come from the process environment; nothing is cached globally. The
//! resulting [`AppConfig`] is passed explicitly into the services that need it.

use std::net::SocketAddr;

use thiserror::Error;

use stockwatch_forecast::{ForecastConfig, WindowDays};
use stockwatch_observability::{LogFormat, UnknownLogFormat};

pub const ENV_BIND_ADDR: &str = "STOCKWATCH_BIND_ADDR";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DEFAULT_WINDOW_DAYS: &str = "STOCKWATCH_DEFAULT_WINDOW_DAYS";
pub const ENV_SEED_DEMO: &str = "STOCKWATCH_SEED_DEMO";
pub const ENV_LOG_FORMAT: &str = "STOCKWATCH_LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid socket address {value:?}")]
    BindAddr { var: &'static str, value: String },

    #[error("{var}: expected a boolean, got {value:?}")]
    Bool { var: &'static str, value: String },

    #[error("STOCKWATCH_LOG_FORMAT: {0}")]
    LogFormat(#[from] UnknownLogFormat),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub forecast: ForecastConfig,
    /// Load the demo fixture into the in-memory store at startup.
    pub seed_demo: bool,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_bind = lookup(ENV_BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_bind.trim().parse().map_err(|_| ConfigError::BindAddr {
            var: ENV_BIND_ADDR,
            value: raw_bind.clone(),
        })?;

        let database_url = lookup(ENV_DATABASE_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        // Same leniency as the request parameter: bad values mean "use the default".
        let default_window =
            WindowDays::parse_or(lookup(ENV_DEFAULT_WINDOW_DAYS).as_deref(), WindowDays::default());

        let seed_demo = match lookup(ENV_SEED_DEMO) {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Bool {
                var: ENV_SEED_DEMO,
                value: raw,
            })?,
        };

        let log_format = match lookup(ENV_LOG_FORMAT) {
            None => LogFormat::default(),
            Some(raw) => raw.parse()?,
        };

        Ok(Self {
            bind_addr,
            database_url,
            forecast: ForecastConfig { default_window },
            seed_demo,
            log_format,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
