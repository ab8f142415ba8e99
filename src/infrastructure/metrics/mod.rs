//! Prometheus Metrics Module
//!
//! Client-side counters for the chat engine.
//!
//! # Metrics Collected
//! - Inbound frames by route (live, history, stale)
//! - Dropped frames that failed to decode
//! - Broker ERROR frames and reconnect attempts
//! - Outbound publishes by destination
//! - Whether the broker connection is currently ready

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Inbound MESSAGE frames by route
pub static FRAMES_RECEIVED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("frames_received_total", "Inbound MESSAGE frames by route")
            .namespace("workspace_chat"),
        &["route"],
    )
    .expect("Failed to create FRAMES_RECEIVED_TOTAL metric")
});

/// Frames dropped because their payload did not decode
pub static DECODE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("decode_failures_total", "Frames dropped after failing to decode")
            .namespace("workspace_chat"),
    )
    .expect("Failed to create DECODE_FAILURES_TOTAL metric")
});

/// ERROR frames reported by the broker
pub static BROKER_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("broker_errors_total", "ERROR frames reported by the broker")
            .namespace("workspace_chat"),
    )
    .expect("Failed to create BROKER_ERRORS_TOTAL metric")
});

/// Reconnect attempts after the socket was lost
pub static RECONNECTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("reconnects_total", "Reconnect attempts after losing the socket")
            .namespace("workspace_chat"),
    )
    .expect("Failed to create RECONNECTS_TOTAL metric")
});

/// Outbound SEND frames by destination
pub static PUBLISHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("publishes_total", "Outbound SEND frames by destination")
            .namespace("workspace_chat"),
        &["destination"], // "message", "history"
    )
    .expect("Failed to create PUBLISHES_TOTAL metric")
});

/// 1 while the broker connection is ready, 0 otherwise
pub static CONNECTION_READY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("connection_ready", "Whether the broker connection is ready")
            .namespace("workspace_chat"),
    )
    .expect("Failed to create CONNECTION_READY metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(FRAMES_RECEIVED_TOTAL.clone()))
        .expect("Failed to register FRAMES_RECEIVED_TOTAL");
    registry
        .register(Box::new(DECODE_FAILURES_TOTAL.clone()))
        .expect("Failed to register DECODE_FAILURES_TOTAL");
    registry
        .register(Box::new(BROKER_ERRORS_TOTAL.clone()))
        .expect("Failed to register BROKER_ERRORS_TOTAL");
    registry
        .register(Box::new(RECONNECTS_TOTAL.clone()))
        .expect("Failed to register RECONNECTS_TOTAL");
    registry
        .register(Box::new(PUBLISHES_TOTAL.clone()))
        .expect("Failed to register PUBLISHES_TOTAL");
    registry
        .register(Box::new(CONNECTION_READY.clone()))
        .expect("Failed to register CONNECTION_READY");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record an inbound frame
pub fn record_inbound(route: &str) {
    FRAMES_RECEIVED_TOTAL.with_label_values(&[route]).inc();
}

/// Helper to record a dropped, undecodable frame
pub fn record_decode_failure() {
    DECODE_FAILURES_TOTAL.inc();
}

/// Helper to record a broker ERROR frame
pub fn record_broker_error() {
    BROKER_ERRORS_TOTAL.inc();
}

/// Helper to record a reconnect attempt
pub fn record_reconnect() {
    RECONNECTS_TOTAL.inc();
}

/// Helper to record an outbound publish
pub fn record_publish(destination: &str) {
    PUBLISHES_TOTAL.with_label_values(&[destination]).inc();
}

/// Helper to update the connection gauge
pub fn set_connection_ready(ready: bool) {
    CONNECTION_READY.set(i64::from(ready));
}
