//! Environment-sourced configuration
//!
//! All settings are read once at startup from environment variables and
//! validated hard: an invalid configuration is a fatal error reported before
//! the exporter serves anything.

use std::time::Duration;

use url::Url;

use crate::errors::{AppError, AppResult};

/// Consecutive failures at which the circuit breaker opens
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Exporter configuration, immutable after startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Tautulli instance (no trailing slash)
    pub tautulli_url: String,
    /// Tautulli API key
    pub api_key: String,
    /// Port the metrics/health server listens on
    pub metrics_port: u16,
    /// Seconds between polls of the activity API
    pub scrape_interval: u64,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// tracing filter directive (overridable via --log-level)
    pub log_level: String,
    /// Keep polling while the circuit breaker is open so it can close again.
    /// Defaults to false, matching the original behavior where an open
    /// breaker stops all requests and never recovers.
    pub probe_when_open: bool,
}

impl Config {
    /// Load and validate configuration from the environment
    pub fn from_env() -> AppResult<Self> {
        let tautulli_url = std::env::var("TAUTULLI_URL")
            .unwrap_or_default()
            .trim()
            .trim_end_matches('/')
            .to_string();
        let api_key = std::env::var("TAUTULLI_API_KEY")
            .unwrap_or_default()
            .trim()
            .to_string();
        let metrics_port = parse_env("METRICS_PORT", 8000i64)?;
        let scrape_interval = parse_env("SCRAPE_INTERVAL", 30u64)?;
        let request_timeout = parse_env("REQUEST_TIMEOUT", 10u64)?;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let probe_when_open = parse_env("PROBE_WHEN_OPEN", false)?;

        if !(1..=65535).contains(&metrics_port) {
            return Err(AppError::configuration(format!(
                "METRICS_PORT {metrics_port} is not valid (must be 1-65535)"
            )));
        }

        let config = Self {
            tautulli_url,
            api_key,
            metrics_port: metrics_port as u16,
            scrape_interval,
            request_timeout,
            log_level: log_level.to_lowercase(),
            probe_when_open,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the loaded values, collecting nothing: the first violation
    /// is returned as a fatal configuration error.
    pub fn validate(&self) -> AppResult<()> {
        if self.tautulli_url.is_empty() {
            return Err(AppError::configuration(
                "TAUTULLI_URL environment variable is required",
            ));
        }

        let parsed = Url::parse(&self.tautulli_url).map_err(|e| {
            AppError::configuration(format!(
                "TAUTULLI_URL '{}' is not a valid URL: {e}",
                self.tautulli_url
            ))
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AppError::configuration(format!(
                    "TAUTULLI_URL scheme must be http or https, not '{other}'"
                )));
            }
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(AppError::configuration(format!(
                "TAUTULLI_URL '{}' is not a valid URL",
                self.tautulli_url
            )));
        }

        if self.api_key.is_empty() {
            return Err(AppError::configuration(
                "TAUTULLI_API_KEY environment variable is required",
            ));
        }
        if self.api_key.len() < 16
            || !self
                .api_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AppError::configuration(
                "TAUTULLI_API_KEY appears to be invalid format",
            ));
        }

        if self.scrape_interval < 5 {
            return Err(AppError::configuration(format!(
                "SCRAPE_INTERVAL {} is too low (minimum 5 seconds)",
                self.scrape_interval
            )));
        }

        Ok(())
    }

    /// Poll interval as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scrape_interval)
    }

    /// Per-request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            AppError::configuration(format!("{name} '{raw}' is not a valid value"))
        }),
        Err(_) => Ok(default),
    }
}
