//! Error type definitions for the Tautulli exporter
//!
//! Two layers: `AppError` for fatal, process-level failures (bad
//! configuration, port binding, metrics encoding) and `PollError` for the
//! per-tick failure kinds counted by the circuit breaker.

use thiserror::Error;

/// Top-level application error type
///
/// Uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (fatal, reported before anything is served)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Failure to bind the metrics port (fatal)
    #[error("Failed to bind metrics server: {0}")]
    ServerBind(#[from] std::io::Error),

    /// Prometheus text-exposition rendering failures
    #[error("Metrics encoding error: {0}")]
    MetricsEncode(#[from] prometheus::Error),
}

/// Per-poll failure kinds
///
/// Every way a single poll of the activity API can fail. All variants are
/// non-fatal: the poll loop logs them, counts them toward the circuit
/// breaker, and waits for the next tick.
#[derive(Error, Debug)]
pub enum PollError {
    /// Network/connection failures reaching the upstream API
    #[error("Connection error: {message}")]
    Network { message: String },

    /// Request exceeded the configured timeout
    #[error("Request timeout after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Upstream responded with a non-2xx status
    #[error("HTTP error: status {status}")]
    HttpStatus { status: u16 },

    /// Response body was not the expected JSON envelope
    #[error("Invalid JSON response: {message}")]
    MalformedBody { message: String },

    /// Upstream API reported a non-success result
    #[error("API returned error: {message}")]
    Api { message: String },
}

impl AppError {
    /// Create a configuration error with a custom message
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl PollError {
    /// Short kind label used in failure logs
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::Network { .. } => "network",
            PollError::Timeout { .. } => "timeout",
            PollError::HttpStatus { .. } => "http_status",
            PollError::MalformedBody { .. } => "malformed_body",
            PollError::Api { .. } => "api_error",
        }
    }

    /// Attach the configured timeout to a timeout error
    ///
    /// reqwest's error does not carry the client timeout, so the activity
    /// client fills it in after conversion.
    pub fn with_timeout_secs(self, timeout_secs: u64) -> Self {
        match self {
            PollError::Timeout { .. } => PollError::Timeout { timeout_secs },
            other => other,
        }
    }
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PollError::Timeout { timeout_secs: 0 }
        } else if err.is_connect() {
            PollError::Network {
                message: err.to_string(),
            }
        } else if err.is_decode() {
            PollError::MalformedBody {
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            PollError::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            PollError::Network {
                message: err.to_string(),
            }
        }
    }
}
