//! Telemetry utilities for connection timing and session spans.

use std::time::Instant;

/// Guard for timing a transport open and recording metrics.
///
/// Records the duration when dropped, labelled `"error"` unless
/// [`ConnectTimer::succeeded`] was called first.
pub struct ConnectTimer {
    outcome: &'static str,
    start: Instant,
}

impl ConnectTimer {
    /// Start timing an open.
    pub fn new() -> Self {
        crate::metrics::record_connect_attempt();
        Self {
            outcome: "error",
            start: Instant::now(),
        }
    }

    /// Mark the open as successful.
    pub fn succeeded(&mut self) {
        self.outcome = "ok";
    }
}

impl Default for ConnectTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConnectTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_connect_duration(self.outcome, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span covering one connection task (all attempts of one `connect()`).
    pub fn session(url: &str, epoch: u64) -> Span {
        info_span!("session", url = %url, epoch = epoch)
    }

    /// Span covering one transport open.
    pub fn attempt(attempt: u32) -> Span {
        info_span!("attempt", attempt = attempt)
    }
}
