// src/config.rs
use crate::api::DEFAULT_BASE_URL;
use crate::error::ConfigError;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

pub const API_URL_VAR: &str = "TRADE_WARS_API_URL";
pub const STATE_FILE_VAR: &str = "TRADE_WARS_STATE_FILE";
pub const TIMEOUT_VAR: &str = "TRADE_WARS_TIMEOUT_SECS";
pub const LOG_VAR: &str = "TRADE_WARS_LOG";

const DEFAULT_STATE_FILE: &str = ".trade-wars/state.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub state_file: PathBuf,
    pub request_timeout: Duration,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_level: LevelFilter::Info,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any variable source; unset or blank variables
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(url) = get(API_URL_VAR) {
            config.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(path) = get(STATE_FILE_VAR) {
            config.state_file = PathBuf::from(path);
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: "expected a positive number of seconds".into(),
                })?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get(LOG_VAR) {
            config.log_level = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: LOG_VAR,
                value: raw.clone(),
                reason: "expected off, error, warn, info, debug or trace".into(),
            })?;
        }
        Ok(config)
    }
}
