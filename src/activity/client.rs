//! Tautulli activity API client
//!
//! Issues one `get_activity` request per poll and maps the response envelope
//! into a list of raw sessions. Retry policy does not live here: a failed
//! request surfaces as a single `PollError` and the poll loop's interval is
//! the only retry mechanism.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::errors::PollError;

/// One session entry from the activity API
///
/// Only the transcode decision fields matter for classification; everything
/// else in the session object is ignored. A missing decision means the
/// dimension is passed through untouched, which Tautulli reports as
/// "direct play".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSession {
    #[serde(default)]
    pub transcode_video_decision: Option<String>,
    #[serde(default)]
    pub transcode_audio_decision: Option<String>,
    #[serde(default)]
    pub transcode_container_decision: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    response: ApiResponse,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    #[serde(default)]
    sessions: Option<Vec<RawSession>>,
}

/// HTTP client for the Tautulli `get_activity` command
pub struct ActivityClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl ActivityClient {
    /// Create a client with the configured request timeout
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("tautulli-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: format!("{}/api/v2", config.tautulli_url),
            api_key: config.api_key.clone(),
            timeout_secs: config.request_timeout,
        }
    }

    /// Fetch the current session list
    ///
    /// Returns an empty list when the API reports success with no sessions.
    pub async fn fetch_activity(&self) -> Result<Vec<RawSession>, PollError> {
        debug!("Fetching activity from {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("apikey", self.api_key.as_str()), ("cmd", "get_activity")])
            .send()
            .await
            .map_err(|e| PollError::from(e).with_timeout_secs(self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PollError::from(e).with_timeout_secs(self.timeout_secs))?;

        parse_activity_body(&body)
    }
}

/// Parse the `get_activity` response envelope
///
/// Split out from the request path so envelope handling is testable without
/// a live upstream.
fn parse_activity_body(body: &str) -> Result<Vec<RawSession>, PollError> {
    let envelope: ApiEnvelope =
        serde_json::from_str(body).map_err(|e| PollError::MalformedBody {
            message: e.to_string(),
        })?;

    let response = envelope.response;
    if response.result.as_deref() != Some("success") {
        return Err(PollError::Api {
            message: response
                .message
                .unwrap_or_else(|| "Unknown error".to_string()),
        });
    }

    Ok(response
        .data
        .and_then(|data| data.sessions)
        .unwrap_or_default())
}
