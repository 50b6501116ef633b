//! Runtime configuration, read from the environment (`.env` is honoured).

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the estimation backend. Empty keeps paths unqualified.
    pub api_url: String,
    pub bind_addr: String,
    /// Idle conversations are purged after this duration.
    pub session_ttl: Duration,
    /// Pause between the last answer and the prediction call.
    pub prediction_delay: Duration,
    pub purge_interval: Duration,
    /// Admin routes reject every request when unset.
    pub admin_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_ttl: Duration::from_secs(30 * 60),
            prediction_delay: Duration::from_millis(1500),
            purge_interval: Duration::from_secs(60),
            admin_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_url: non_empty("ESTIMATOR_API_URL").unwrap_or(defaults.api_url),
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            session_ttl: match non_empty("SESSION_TTL_SECS") {
                Some(raw) => Duration::from_secs(parse("SESSION_TTL_SECS", &raw)?),
                None => defaults.session_ttl,
            },
            prediction_delay: match non_empty("PREDICTION_DELAY_MS") {
                Some(raw) => Duration::from_millis(parse("PREDICTION_DELAY_MS", &raw)?),
                None => defaults.prediction_delay,
            },
            purge_interval: match non_empty("PURGE_INTERVAL_SECS") {
                Some(raw) => Duration::from_secs(parse("PURGE_INTERVAL_SECS", &raw)?),
                None => defaults.purge_interval,
            },
            admin_key: non_empty("ADMIN_KEY"),
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}
