//! Prometheus exporter for Plex stream activity via the Tautulli API
//!
//! Polls Tautulli's `get_activity` command on a fixed interval, classifies
//! the active sessions into direct-play vs. transcode counters, and serves
//! them as Prometheus gauges alongside liveness/readiness probes.

pub mod activity;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod poller;
pub mod web;
