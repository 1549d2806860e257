//! Error types for the realtime wire protocol.
//!
//! Covers Engine.IO framing failures, Socket.IO packet decoding failures
//! and payloads that do not match the shape of a known inbox event.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// Frame or packet had no content at all.
    #[error("empty packet")]
    EmptyPacket,

    /// The leading Engine.IO type digit is not one we know.
    #[error("unknown engine packet type: {0:?}")]
    UnknownEngineType(char),

    /// The leading Socket.IO type digit is not one we know.
    #[error("unknown socket packet type: {0:?}")]
    UnknownPacketType(char),

    /// Binary events carry attachments in separate frames, which this client
    /// does not negotiate.
    #[error("binary packets are not supported")]
    BinaryUnsupported,

    /// Acknowledgement id did not fit in a `u64`.
    #[error("invalid ack id: {0}")]
    InvalidAckId(String),

    /// JSON section failed to decode.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// EVENT packet whose payload was not `["name", ...args]`.
    #[error("event packet without a name")]
    MissingEventName,

    /// Payload present but shaped wrongly for the packet it belongs to.
    #[error("unexpected payload for {context}")]
    UnexpectedPayload {
        /// What was being decoded when the mismatch was found.
        context: &'static str,
    },
}

impl ProtocolError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyPacket => "empty_packet",
            Self::UnknownEngineType(_) => "unknown_engine_type",
            Self::UnknownPacketType(_) => "unknown_packet_type",
            Self::BinaryUnsupported => "binary_unsupported",
            Self::InvalidAckId(_) => "invalid_ack_id",
            Self::Json(_) => "json",
            Self::MissingEventName => "missing_event_name",
            Self::UnexpectedPayload { .. } => "unexpected_payload",
        }
    }
}
