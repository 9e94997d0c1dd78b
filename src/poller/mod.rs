//! Activity poll loop
//!
//! Drives the activity client on a fixed interval, feeds the classifier's
//! output into the shared metrics state, and enforces the circuit breaker.
//! The loop owns all write access to `MetricsState`.

use std::sync::Arc;
use std::time::Instant;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::activity::{classify, ActivityClient};
use crate::config::{Config, MAX_CONSECUTIVE_FAILURES};
use crate::metrics::MetricsState;

/// Fixed-interval polling service
pub struct PollerService {
    client: ActivityClient,
    metrics: Arc<MetricsState>,
    config: Config,
    shutdown: CancellationToken,
}

impl PollerService {
    pub fn new(
        client: ActivityClient,
        metrics: Arc<MetricsState>,
        config: Config,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            metrics,
            config,
            shutdown,
        }
    }

    /// Run until the shutdown token is cancelled
    ///
    /// The first tick fires immediately, so the exporter has data as soon as
    /// the upstream answers once. A shutdown signal during the wait ends the
    /// loop without sitting out the remainder of the interval; an in-flight
    /// request is never hard-cancelled, it finishes or hits its own timeout.
    pub async fn run(self) {
        info!(
            interval_secs = self.config.scrape_interval,
            "Starting activity poller"
        );

        let mut timer = interval(self.config.poll_interval());
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            self.poll_once().await;
        }

        info!("Activity poller stopped");
    }

    /// One tick: honor the breaker, fetch, classify, record
    async fn poll_once(&self) {
        if self.metrics.is_circuit_open() {
            let failures = self.metrics.snapshot_for_health().failures;
            if !self.config.probe_when_open {
                error!(
                    failures,
                    "Circuit breaker active: skipping poll ({failures} consecutive failures)"
                );
                return;
            }
            debug!(failures, "Circuit breaker open, probing upstream anyway");
        }

        match self.client.fetch_activity().await {
            Ok(sessions) => {
                let aggregate = classify(&sessions);
                self.metrics.record_success(aggregate, Instant::now());
                debug!(
                    total_streams = aggregate.total,
                    direct_streams = aggregate.direct,
                    transcode_streams = aggregate.transcode,
                    video_transcodes = aggregate.video_transcodes,
                    audio_transcodes = aggregate.audio_transcodes,
                    container_transcodes = aggregate.container_transcodes,
                    "Metrics updated"
                );
            }
            Err(e) => {
                let failures = self.metrics.record_failure();
                error!(
                    kind = e.kind(),
                    "{e} (failure {failures}/{MAX_CONSECUTIVE_FAILURES})"
                );
            }
        }
    }
}
