//! Socket.IO v5 packets.
//!
//! Wire layout, carried inside an Engine.IO `message` packet:
//!
//! ```text
//! <type>[<namespace>,][<ack id>][<json payload>]
//! ```
//!
//! The namespace is omitted for the root namespace `/`. Binary packet types
//! (`5`, `6`) are rejected since their attachments travel in separate frames.

use crate::error::{ProtocolError, Result};
use serde_json::Value;
use std::fmt;

/// The root namespace.
pub const ROOT_NAMESPACE: &str = "/";

/// Socket.IO packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// `0` - namespace connect (client: auth payload, server: session data).
    Connect,
    /// `1` - namespace disconnect.
    Disconnect,
    /// `2` - named event.
    Event,
    /// `3` - acknowledgement.
    Ack,
    /// `4` - namespace connection refused.
    ConnectError,
}

impl PacketKind {
    fn from_char(c: char) -> Result<Self> {
        match c {
            '0' => Ok(Self::Connect),
            '1' => Ok(Self::Disconnect),
            '2' => Ok(Self::Event),
            '3' => Ok(Self::Ack),
            '4' => Ok(Self::ConnectError),
            '5' | '6' => Err(ProtocolError::BinaryUnsupported),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    fn as_char(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
        }
    }
}

/// A decoded Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Packet type.
    pub kind: PacketKind,
    /// Namespace the packet belongs to.
    pub namespace: String,
    /// Acknowledgement id, when the sender expects an ack.
    pub ack_id: Option<u64>,
    /// JSON payload.
    pub data: Option<Value>,
}

impl Packet {
    fn new(kind: PacketKind, data: Option<Value>) -> Self {
        Self {
            kind,
            namespace: ROOT_NAMESPACE.to_string(),
            ack_id: None,
            data,
        }
    }

    /// CONNECT to the root namespace, with an optional auth object.
    pub fn connect(auth: Option<Value>) -> Self {
        Self::new(PacketKind::Connect, auth)
    }

    /// DISCONNECT from the root namespace.
    pub fn disconnect() -> Self {
        Self::new(PacketKind::Disconnect, None)
    }

    /// EVENT with the given name and arguments.
    pub fn event(name: &str, args: impl IntoIterator<Item = Value>) -> Self {
        let mut items = vec![Value::String(name.to_string())];
        items.extend(args);
        Self::new(PacketKind::Event, Some(Value::Array(items)))
    }

    /// Name of an EVENT packet.
    pub fn event_name(&self) -> Option<&str> {
        if self.kind != PacketKind::Event {
            return None;
        }
        match &self.data {
            Some(Value::Array(items)) => items.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Arguments of an EVENT packet (everything after the name).
    pub fn event_args(&self) -> &[Value] {
        match (&self.kind, &self.data) {
            (PacketKind::Event, Some(Value::Array(items))) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// Human-readable reason carried by a CONNECT_ERROR packet.
    pub fn error_message(&self) -> Option<String> {
        if self.kind != PacketKind::ConnectError {
            return None;
        }
        match &self.data {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(map)) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(Value::Object(map.clone()).to_string())),
            _ => None,
        }
    }

    /// Parse the Socket.IO part of an Engine.IO message.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        let kind = PacketKind::from_char(chars.next().ok_or(ProtocolError::EmptyPacket)?)?;
        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            let (nsp, tail) = match rest.find(',') {
                Some(idx) => (&rest[..idx], &rest[idx + 1..]),
                None => (rest, ""),
            };
            rest = tail;
            nsp.to_string()
        } else {
            ROOT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let ack_id = if digits > 0 {
            let (id, tail) = rest.split_at(digits);
            rest = tail;
            Some(id.parse::<u64>().map_err(|_| ProtocolError::InvalidAckId(id.to_string()))?)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest)?)
        };

        let packet = Self {
            kind,
            namespace,
            ack_id,
            data,
        };
        packet.validate()?;
        Ok(packet)
    }

    fn validate(&self) -> Result<()> {
        let ok = match (self.kind, &self.data) {
            (PacketKind::Connect, None | Some(Value::Object(_))) => true,
            (PacketKind::Disconnect, None) => true,
            (PacketKind::ConnectError, Some(Value::Object(_) | Value::String(_))) => true,
            (PacketKind::Ack, Some(Value::Array(_))) => true,
            (PacketKind::Event, Some(Value::Array(items))) => {
                return match items.first() {
                    Some(Value::String(_)) => Ok(()),
                    _ => Err(ProtocolError::MissingEventName),
                };
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedPayload {
                context: match self.kind {
                    PacketKind::Connect => "connect",
                    PacketKind::Disconnect => "disconnect",
                    PacketKind::Event => "event",
                    PacketKind::Ack => "ack",
                    PacketKind::ConnectError => "connect_error",
                },
            })
        }
    }

    /// Encode into the Socket.IO text form (without the Engine.IO prefix).
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.as_char())?;
        if self.namespace != ROOT_NAMESPACE {
            write!(f, "{},", self.namespace)?;
        }
        if let Some(id) = self.ack_id {
            write!(f, "{}", id)?;
        }
        if let Some(data) = &self.data {
            write!(f, "{}", data)?;
        }
        Ok(())
    }
}
