//! Shared metrics and health state
//!
//! One `MetricsState` instance is shared between the poll loop (writer) and
//! the web handlers (readers). Every access goes through the single mutex so
//! a scrape never observes a half-updated set of counters. The prometheus
//! gauges are only ever set inside `record_success`, under that same lock.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use prometheus::{Encoder, IntGauge, Registry, TextEncoder};

use crate::activity::Aggregate;
use crate::config::MAX_CONSECUTIVE_FAILURES;
use crate::errors::AppResult;

/// Read-only view of the circuit state for readiness checks
#[derive(Debug, Clone, Copy)]
pub struct HealthSnapshot {
    pub failures: u32,
    /// None until the first successful poll (startup grace period)
    pub last_success: Option<Instant>,
}

/// Readiness verdict derived from a `HealthSnapshot`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady { since_secs: u64, failures: u32 },
}

#[derive(Debug, Default)]
struct CircuitState {
    aggregate: Aggregate,
    consecutive_failures: u32,
    last_success: Option<Instant>,
}

struct StreamGauges {
    total: IntGauge,
    direct: IntGauge,
    transcode: IntGauge,
    video: IntGauge,
    audio: IntGauge,
    container: IntGauge,
}

/// Shared metrics/health state
pub struct MetricsState {
    inner: Mutex<CircuitState>,
    registry: Registry,
    gauges: StreamGauges,
}

impl MetricsState {
    /// Create the state with all gauges registered
    pub fn new() -> AppResult<Self> {
        let registry = Registry::new();
        let gauges = StreamGauges {
            total: IntGauge::new(
                "plex_active_streams_total",
                "Total number of active Plex streams",
            )?,
            direct: IntGauge::new(
                "plex_active_streams_direct",
                "Number of direct play streams",
            )?,
            transcode: IntGauge::new(
                "plex_active_streams_transcode",
                "Number of transcoding streams",
            )?,
            video: IntGauge::new("plex_transcode_video_sessions", "Video transcoding sessions")?,
            audio: IntGauge::new("plex_transcode_audio_sessions", "Audio transcoding sessions")?,
            container: IntGauge::new(
                "plex_transcode_container_sessions",
                "Container transcoding sessions",
            )?,
        };

        registry.register(Box::new(gauges.total.clone()))?;
        registry.register(Box::new(gauges.direct.clone()))?;
        registry.register(Box::new(gauges.transcode.clone()))?;
        registry.register(Box::new(gauges.video.clone()))?;
        registry.register(Box::new(gauges.audio.clone()))?;
        registry.register(Box::new(gauges.container.clone()))?;

        Ok(Self {
            inner: Mutex::new(CircuitState::default()),
            registry,
            gauges,
        })
    }

    /// Record a successful poll: replace the aggregate, reset the failure
    /// counter, stamp the success time, and push the new counts into the
    /// exported gauges. All under one lock so readers never see a torn mix.
    pub fn record_success(&self, aggregate: Aggregate, now: Instant) {
        let mut inner = self.inner.lock().expect("metrics state lock poisoned");
        inner.aggregate = aggregate;
        inner.consecutive_failures = 0;
        inner.last_success = Some(now);

        self.gauges.total.set(aggregate.total as i64);
        self.gauges.direct.set(aggregate.direct as i64);
        self.gauges.transcode.set(aggregate.transcode as i64);
        self.gauges.video.set(aggregate.video_transcodes as i64);
        self.gauges.audio.set(aggregate.audio_transcodes as i64);
        self.gauges
            .container
            .set(aggregate.container_transcodes as i64);
    }

    /// Record a failed poll and return the new consecutive-failure count.
    /// Gauges and the last-success stamp are left untouched: a transient
    /// outage keeps exporting the last known values rather than a false zero.
    pub fn record_failure(&self) -> u32 {
        let mut inner = self.inner.lock().expect("metrics state lock poisoned");
        inner.consecutive_failures += 1;
        inner.consecutive_failures
    }

    /// Current failure count and last success time
    pub fn snapshot_for_health(&self) -> HealthSnapshot {
        let inner = self.inner.lock().expect("metrics state lock poisoned");
        HealthSnapshot {
            failures: inner.consecutive_failures,
            last_success: inner.last_success,
        }
    }

    /// Whether the circuit breaker is open
    pub fn is_circuit_open(&self) -> bool {
        self.snapshot_for_health().failures >= MAX_CONSECUTIVE_FAILURES
    }

    /// Readiness verdict at `now`
    ///
    /// Ready while no poll has succeeded yet (startup grace period), or while
    /// the last success is fresher than two poll intervals and the breaker is
    /// closed.
    pub fn readiness(&self, poll_interval: Duration, now: Instant) -> Readiness {
        let snapshot = self.snapshot_for_health();
        match snapshot.last_success {
            None => Readiness::Ready,
            Some(last) => {
                let since = now.saturating_duration_since(last);
                if since < poll_interval * 2 && snapshot.failures < MAX_CONSECUTIVE_FAILURES {
                    Readiness::Ready
                } else {
                    Readiness::NotReady {
                        since_secs: since.as_secs(),
                        failures: snapshot.failures,
                    }
                }
            }
        }
    }

    /// Render all registered gauges in Prometheus text exposition format
    pub fn render(&self) -> AppResult<String> {
        // Hold the lock so a scrape racing a record_success gets either the
        // full old set of gauge values or the full new one.
        let _inner = self.inner.lock().expect("metrics state lock poisoned");
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Last recorded aggregate (used in logs and tests)
    pub fn aggregate(&self) -> Aggregate {
        self.inner
            .lock()
            .expect("metrics state lock poisoned")
            .aggregate
    }
}
