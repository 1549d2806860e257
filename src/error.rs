//! Unified error handling for contactio-realtime.
//!
//! Public client methods never surface these to callers; they end up in
//! logs, `connect_error` events and metric labels instead.

use contactio_proto::ProtocolError;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

// ============================================================================
// Transport Errors (opening and driving a session)
// ============================================================================

/// Errors that can occur while opening or using a transport session.
#[derive(Debug, Error)]
#[allow(clippy::large_enum_variant)] // WebSocket variant is large but only built on failure
pub enum TransportError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server refused the namespace connection (usually bad auth).
    #[error("connection rejected: {0}")]
    Rejected(String),

    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),

    /// The connection went away before the handshake finished, or a send
    /// was attempted on a closed session.
    #[error("connection closed: {0}")]
    Closed(String),
}

impl TransportError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidEndpoint(_) => "invalid_endpoint",
            Self::WebSocket(_) => "websocket",
            Self::Protocol(_) => "protocol",
            Self::Rejected(_) => "rejected",
            Self::Timeout(_) => "timeout",
            Self::Closed(_) => "closed",
        }
    }
}
