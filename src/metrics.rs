//! Prometheus metrics collection for contactio-realtime.
//!
//! Metrics live in process-wide statics and are registered by [`init`].
//! Recording helpers silently do nothing until then, so library users that
//! never call `init` pay nothing.
//!
//! - `contactio_connect_attempts_total` - transport opens started
//! - `contactio_connect_errors_total{error}` - failed opens by error code
//! - `contactio_connect_duration_seconds{outcome}` - time to open a session
//! - `contactio_disconnects_total{reason}` - session ends by reason
//! - `contactio_events_received_total{event}` - server pushes dispatched
//! - `contactio_events_emitted_total{event}` - client requests sent
//! - `contactio_subscriptions_replayed_total` - subscribes sent during replay
//! - `contactio_connection_state` - 0 disconnected, 1 connecting, 2 connected
//! - `contactio_tracked_subscriptions` - size of the subscription set

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

use crate::state::ConnectionState;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Transport opens started.
pub static CONNECT_ATTEMPTS: OnceLock<IntCounter> = OnceLock::new();

/// Failed transport opens by error code.
pub static CONNECT_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Session ends by disconnect reason.
pub static DISCONNECTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Server-pushed events dispatched to listeners.
pub static EVENTS_RECEIVED: OnceLock<IntCounterVec> = OnceLock::new();

/// Client requests written to the transport.
pub static EVENTS_EMITTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Subscribe requests sent while replaying after a (re)connect.
pub static SUBSCRIPTIONS_REPLAYED: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Gauges (can increase/decrease)
// ========================================================================

/// Current connection state.
pub static CONNECTION_STATE: OnceLock<IntGauge> = OnceLock::new();

/// Conversations currently tracked for replay.
pub static TRACKED_SUBSCRIPTIONS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Time from starting an open to success or failure.
pub static CONNECT_DURATION: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any metrics are recorded. Repeated calls are
/// harmless: the statics keep their first value.
pub fn init() {
    let r = registry();

    // Helper macro to register metric
    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if let Err(e) = r.register(Box::new(m.clone())) {
                    tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                }
                let _ = $metric.set(m);
            }
        };
    }

    register!(CONNECT_ATTEMPTS, IntCounter::new("contactio_connect_attempts_total", "Transport opens started"));
    register!(CONNECT_ERRORS, IntCounterVec::new(Opts::new("contactio_connect_errors_total", "Failed transport opens by error"), &["error"]));
    register!(DISCONNECTS, IntCounterVec::new(Opts::new("contactio_disconnects_total", "Session ends by reason"), &["reason"]));
    register!(EVENTS_RECEIVED, IntCounterVec::new(Opts::new("contactio_events_received_total", "Server events dispatched to listeners"), &["event"]));
    register!(EVENTS_EMITTED, IntCounterVec::new(Opts::new("contactio_events_emitted_total", "Client events sent to the server"), &["event"]));
    register!(SUBSCRIPTIONS_REPLAYED, IntCounter::new("contactio_subscriptions_replayed_total", "Subscriptions replayed after connect"));
    register!(CONNECTION_STATE, IntGauge::new("contactio_connection_state", "0 disconnected, 1 connecting, 2 connected"));
    register!(TRACKED_SUBSCRIPTIONS, IntGauge::new("contactio_tracked_subscriptions", "Conversations tracked for replay"));
    register!(CONNECT_DURATION, HistogramVec::new(
        HistogramOpts::new("contactio_connect_duration_seconds", "Time to open a transport session")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
        &["outcome"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Record the start of a transport open.
#[inline]
pub fn record_connect_attempt() {
    if let Some(c) = CONNECT_ATTEMPTS.get() {
        c.inc();
    }
}

/// Record a failed transport open.
#[inline]
pub fn record_connect_error(error: &str) {
    if let Some(c) = CONNECT_ERRORS.get() {
        c.with_label_values(&[error]).inc();
    }
}

/// Record how long an open took.
#[inline]
pub fn record_connect_duration(outcome: &str, duration_secs: f64) {
    if let Some(h) = CONNECT_DURATION.get() {
        h.with_label_values(&[outcome]).observe(duration_secs);
    }
}

/// Record the end of a session.
#[inline]
pub fn record_disconnect(reason: &str) {
    if let Some(c) = DISCONNECTS.get() {
        c.with_label_values(&[reason]).inc();
    }
}

/// Record a server event handed to listeners.
#[inline]
pub fn record_event_received(event: &str) {
    if let Some(c) = EVENTS_RECEIVED.get() {
        c.with_label_values(&[event]).inc();
    }
}

/// Record a client event written to the transport.
#[inline]
pub fn record_event_emitted(event: &str) {
    if let Some(c) = EVENTS_EMITTED.get() {
        c.with_label_values(&[event]).inc();
    }
}

/// Record how many subscriptions a replay sent.
#[inline]
pub fn record_replay(count: usize) {
    if let Some(c) = SUBSCRIPTIONS_REPLAYED.get() {
        c.inc_by(count as u64);
    }
}

/// Update the connection state gauge.
#[inline]
pub fn set_connection_state(state: ConnectionState) {
    if let Some(g) = CONNECTION_STATE.get() {
        g.set(state.as_gauge());
    }
}

/// Update the tracked subscriptions gauge.
#[inline]
pub fn set_tracked_subscriptions(count: usize) {
    if let Some(g) = TRACKED_SUBSCRIPTIONS.get() {
        g.set(count as i64);
    }
}
