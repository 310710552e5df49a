//! Centralized configuration (environment variables + defaults).

use crate::domain::retry::RetryPolicy;
use crate::error::{DataError, Result};
use crate::infra::remote::RestConfig;
use std::time::Duration;

pub const DEFAULT_LOCAL_STORE_URL: &str = "sqlite://bizdata-local.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct DataLayerConfig {
    /// Remote REST endpoint. `None` runs the layer offline-only.
    pub remote_url: Option<String>,
    pub remote_api_key: Option<String>,
    pub local_store_url: String,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub request_timeout_secs: u64,
    pub bind_addr: String,
}

impl Default for DataLayerConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            remote_url: None,
            remote_api_key: None,
            local_store_url: DEFAULT_LOCAL_STORE_URL.to_string(),
            max_retries: retry.max_retries,
            retry_base_delay: retry.base_delay,
            request_timeout_secs: 30,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl DataLayerConfig {
    /// Reads the environment (after loading `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_retries = match non_empty("MAX_RETRIES") {
            Some(v) => parse_number::<u32>("MAX_RETRIES", &v)?,
            None => defaults.max_retries,
        };
        let retry_base_delay = match non_empty("RETRY_BASE_DELAY_MS") {
            Some(v) => Duration::from_millis(parse_number::<u64>("RETRY_BASE_DELAY_MS", &v)?),
            None => defaults.retry_base_delay,
        };
        let request_timeout_secs = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(v) => parse_number::<u64>("REQUEST_TIMEOUT_SECS", &v)?.max(1),
            None => defaults.request_timeout_secs,
        };

        Ok(Self {
            remote_url: non_empty("REMOTE_URL"),
            remote_api_key: non_empty("REMOTE_API_KEY"),
            local_store_url: non_empty("LOCAL_STORE_URL").unwrap_or(defaults.local_store_url),
            max_retries,
            retry_base_delay,
            request_timeout_secs,
            bind_addr: non_empty("API_BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay)
    }

    /// REST client settings, if a remote is configured.
    pub fn rest_config(&self) -> Option<RestConfig> {
        self.remote_url.as_ref().map(|url| RestConfig {
            base_url: url.clone(),
            api_key: self.remote_api_key.clone(),
            timeout_secs: self.request_timeout_secs,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| DataError::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}
