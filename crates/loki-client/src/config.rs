// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::{DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_WAIT, DEFAULT_TIMEOUT, DEFAULT_URL};
use crate::error::ClientError;
use std::env;
use std::time::Duration;

/// Flush thresholds of the batch service. Immutable once the client is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of streams that triggers a flush.
    pub max_batch_size: usize,
    /// Longest time a non-empty batch stays unflushed.
    pub max_wait: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.max_batch_size == 0 {
            return Err(ClientError::InvalidConfig(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.max_wait.is_zero() {
            return Err(ClientError::InvalidConfig(
                "max_wait must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a [`crate::LokiClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the Loki server (e.g. `http://localhost:3100`)
    pub url: String,
    /// Flush thresholds
    pub batch: BatchConfig,
    /// Timeout applied to every HTTP request
    pub timeout: Duration,
    /// Optional tenant sent as `X-Scope-OrgID`
    pub tenant_id: Option<String>,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            batch: BatchConfig::default(),
            timeout: DEFAULT_TIMEOUT,
            tenant_id: None,
            https_proxy: None,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `url` with default thresholds.
    pub fn new(url: impl Into<String>, max_batch_size: usize, max_wait: Duration) -> Self {
        Self {
            url: url.into(),
            batch: BatchConfig {
                max_batch_size,
                max_wait,
            },
            ..Default::default()
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ClientError> {
        let defaults = Self::default();

        let url = env::var("LOKI_URL").unwrap_or(defaults.url);
        let max_batch_size = parse_env("LOKI_BATCH_SIZE")?.unwrap_or(defaults.batch.max_batch_size);
        let max_wait = parse_env("LOKI_BATCH_WAIT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.batch.max_wait);
        let timeout = parse_env("LOKI_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let tenant_id = env::var("LOKI_TENANT_ID")
            .ok()
            .filter(|tenant| !tenant.trim().is_empty());
        let https_proxy = env::var("LOKI_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();
        let log_level = env::var("LOKI_LOG_LEVEL")
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);

        let config = Self {
            url,
            batch: BatchConfig {
                max_batch_size,
                max_wait,
            },
            timeout,
            tenant_id,
            https_proxy,
            log_level,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ClientError::InvalidConfig(
                "LOKI_URL cannot be empty".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidConfig(format!(
                "URL '{url}' must start with http:// or https://"
            )));
        }

        self.batch.validate()?;

        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "timeout must be greater than 0".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ClientError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Base URL without trailing slashes, ready for endpoint paths.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ClientError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ClientError::InvalidConfig(format!("{name} has invalid value '{raw}'"))),
        Err(_) => Ok(None),
    }
}
