//! Client configuration.
//!
//! # Environment Variables
//!
//! - `TASK_API_BASE_URL`: API root (default: `http://localhost:5000/api`)
//! - `TASK_API_TIMEOUT_SECS`: per-request timeout in seconds (default: none)

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default API root used when `TASK_API_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Errors in the client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientConfigError {
    #[error("Invalid TASK_API_TIMEOUT_SECS: '{0}'. Expected a positive number of seconds")]
    InvalidTimeout(String),

    #[error("Invalid TASK_API_BASE_URL: '{0}'. Expected an http(s) URL")]
    InvalidBaseUrl(String),
}

/// Where and how the client reaches the task API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for the given API root.
    ///
    /// Trailing slashes are dropped, so `http://host/api/` and
    /// `http://host/api` are equivalent.
    ///
    /// # Errors
    ///
    /// Returns `ClientConfigError::InvalidBaseUrl` unless the URL starts
    /// with `http://` or `https://`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientConfigError> {
        let raw = base_url.into();
        let base_url = raw.trim().trim_end_matches('/').to_string();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientConfigError::InvalidBaseUrl(raw));
        }

        Ok(Self {
            base_url,
            timeout: None,
        })
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ClientConfigError` if either variable holds an invalid value.
    pub fn from_env() -> Result<Self, ClientConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    ///
    /// Unset and blank variables fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ClientConfigError` if either variable holds an invalid value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ClientConfigError> {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = match present("TASK_API_BASE_URL") {
            Some(url) => Self::new(url)?,
            None => Self::default(),
        };

        match present("TASK_API_TIMEOUT_SECS") {
            Some(raw) => Ok(config.with_timeout(parse_timeout(&raw)?)),
            None => Ok(config),
        }
    }

    /// API root without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// URL of the task collection.
    #[must_use]
    pub fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    /// URL of a single task.
    #[must_use]
    pub fn task_url(&self, id: impl std::fmt::Display) -> String {
        format!("{}/tasks/{id}", self.base_url)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ClientConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ClientConfigError::InvalidTimeout(raw.to_string())),
    }
}
