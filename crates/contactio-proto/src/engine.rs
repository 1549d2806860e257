//! Engine.IO v4 framing.
//!
//! Every WebSocket text frame carries exactly one Engine.IO packet: a single
//! type digit followed by an optional payload. Socket.IO packets ride inside
//! [`EnginePacket::Message`].

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Engine.IO protocol revision spoken by this crate.
pub const ENGINE_PROTOCOL: u8 = 4;

/// Handshake data sent by the server in the `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    /// Engine session id.
    pub sid: String,
    /// Transports the server offers to upgrade to.
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Interval between server pings, in milliseconds.
    pub ping_interval: u64,
    /// Grace period after a missed ping, in milliseconds.
    pub ping_timeout: u64,
    /// Largest payload the server accepts, in bytes.
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl OpenInfo {
    /// How long the client may go without hearing a ping before the
    /// connection is considered dead.
    pub fn liveness_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// A single Engine.IO packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// `0` - session opened.
    Open(OpenInfo),
    /// `1` - transport is being closed.
    Close,
    /// `2` - heartbeat, optionally carrying probe data.
    Ping(Option<String>),
    /// `3` - heartbeat reply.
    Pong(Option<String>),
    /// `4` - carries a Socket.IO packet.
    Message(String),
    /// `5` - transport upgrade.
    Upgrade,
    /// `6` - no-op.
    Noop,
}

impl EnginePacket {
    /// Parse a text frame into an Engine.IO packet.
    pub fn parse(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let rest = chars.as_str();
        let data = (!rest.is_empty()).then(|| rest.to_string());

        match kind {
            '0' => Ok(Self::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(data)),
            '3' => Ok(Self::Pong(data)),
            '4' => Ok(Self::Message(rest.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            other => Err(ProtocolError::UnknownEngineType(other)),
        }
    }

    /// Encode this packet as a text frame.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// The reply a client owes for this packet, if any.
    pub fn reply(&self) -> Option<EnginePacket> {
        match self {
            Self::Ping(data) => Some(Self::Pong(data.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for EnginePacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(info) => {
                let json = serde_json::to_string(info).map_err(|_| fmt::Error)?;
                write!(f, "0{}", json)
            }
            Self::Close => f.write_str("1"),
            Self::Ping(data) => write!(f, "2{}", data.as_deref().unwrap_or("")),
            Self::Pong(data) => write!(f, "3{}", data.as_deref().unwrap_or("")),
            Self::Message(payload) => write!(f, "4{}", payload),
            Self::Upgrade => f.write_str("5"),
            Self::Noop => f.write_str("6"),
        }
    }
}
