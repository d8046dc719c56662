//! Client configuration.
//!
//! # Environment Variables
//!
//! | Setting | Variable | Default |
//! |---------|----------|---------|
//! | Base URL | `SENSORLAKE_BASE_URL` | `http://localhost:8086` |
//! | API key | `SENSORLAKE_API_KEY` | none |
//! | Timeout | `SENSORLAKE_TIMEOUT_MS` | `30000` |
//! | API version | `SENSORLAKE_API_VERSION` | `v2` |

use std::env;

use sensorlake_core::ValidationError;

use crate::http_client::HttpAuth;
use crate::retry::RetryConfig;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8086";
pub const DEFAULT_API_VERSION: &str = "v2";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_version: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_version: String::from(DEFAULT_API_VERSION),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: String::from(concat!("sensorlake/", env!("CARGO_PKG_VERSION"))),
            retry: RetryConfig::no_retry(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads `SENSORLAKE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = non_blank("SENSORLAKE_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(api_version) = non_blank("SENSORLAKE_API_VERSION") {
            config.api_version = api_version;
        }
        config.api_key = non_blank("SENSORLAKE_API_KEY");

        if let Some(raw) = non_blank("SENSORLAKE_TIMEOUT_MS") {
            config.timeout_ms = match raw.trim().parse::<u64>() {
                Ok(timeout_ms) if timeout_ms > 0 => timeout_ms,
                _ => {
                    return Err(ValidationError::InvalidConfig {
                        name: "SENSORLAKE_TIMEOUT_MS",
                        value: raw,
                    })
                }
            };
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn auth(&self) -> HttpAuth {
        match &self.api_key {
            Some(key) => HttpAuth::BearerToken(key.clone()),
            None => HttpAuth::None,
        }
    }

    /// Joins `path` onto the base URL with exactly one separating slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
