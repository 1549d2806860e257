//! Typed inbox events.
//!
//! Maps between Socket.IO EVENT packets and the closed set of events the
//! inbox uses: three server-pushed events, two client-emitted requests and
//! the connection lifecycle names listeners can register for.

use crate::conversation::{ConversationId, ConversationUpdate, NewMessage, ReadReceipt};
use crate::error::{ProtocolError, Result};
use crate::packet::Packet;
use serde_json::Value;
use std::fmt;

/// Every event name a local listener can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    /// `connect` - a transport session was (re)established.
    Connect,
    /// `disconnect` - the session ended.
    Disconnect,
    /// `connect_error` - an attempt to open a session failed.
    ConnectError,
    /// `conversation:updated`
    ConversationUpdated,
    /// `message:new`
    MessageNew,
    /// `message:read`
    MessageRead,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 6] = [
        Self::Connect,
        Self::Disconnect,
        Self::ConnectError,
        Self::ConversationUpdated,
        Self::MessageNew,
        Self::MessageRead,
    ];

    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::ConnectError => "connect_error",
            Self::ConversationUpdated => "conversation:updated",
            Self::MessageNew => "message:new",
            Self::MessageRead => "message:read",
        }
    }

    /// Look up a kind by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether the server pushes this event (as opposed to it being
    /// synthesized from the connection lifecycle).
    pub fn is_server_pushed(self) -> bool {
        matches!(
            self,
            Self::ConversationUpdated | Self::MessageNew | Self::MessageRead
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    /// The server disconnected the namespace on purpose.
    IoServerDisconnect,
    /// The client called `disconnect()`.
    IoClientDisconnect,
    /// No heartbeat from the server within the allowed window.
    PingTimeout,
    /// The underlying connection was closed.
    TransportClose,
    /// The underlying connection failed.
    TransportError,
    /// The server sent something undecodable.
    ParseError,
}

impl DisconnectReason {
    /// Canonical reason string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IoServerDisconnect => "io server disconnect",
            Self::IoClientDisconnect => "io client disconnect",
            Self::PingTimeout => "ping timeout",
            Self::TransportClose => "transport close",
            Self::TransportError => "transport error",
            Self::ParseError => "parse error",
        }
    }

    /// Whether the client should reconnect on its own after this reason.
    ///
    /// Deliberate disconnects (either side) stay down until the next
    /// explicit `connect()`.
    pub fn should_reconnect(self) -> bool {
        !matches!(self, Self::IoServerDisconnect | Self::IoClientDisconnect)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events pushed by the inbox server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// `conversation:updated`
    ConversationUpdated(ConversationUpdate),
    /// `message:new`
    MessageNew(NewMessage),
    /// `message:read`
    MessageRead(ReadReceipt),
}

impl ServerEvent {
    /// Kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ConversationUpdated(_) => EventKind::ConversationUpdated,
            Self::MessageNew(_) => EventKind::MessageNew,
            Self::MessageRead(_) => EventKind::MessageRead,
        }
    }

    /// Conversation the event concerns.
    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            Self::ConversationUpdated(update) => &update.conversation_id,
            Self::MessageNew(msg) => &msg.conversation_id,
            Self::MessageRead(receipt) => &receipt.conversation_id,
        }
    }

    /// Decode an EVENT packet.
    ///
    /// Returns `Ok(None)` for event names the inbox does not know, so newer
    /// servers can add events without breaking older clients.
    pub fn from_packet(packet: &Packet) -> Result<Option<Self>> {
        let name = packet.event_name().ok_or(ProtocolError::MissingEventName)?;
        let kind = match EventKind::from_name(name) {
            Some(kind) if kind.is_server_pushed() => kind,
            _ => return Ok(None),
        };
        let payload = packet
            .event_args()
            .first()
            .cloned()
            .ok_or(ProtocolError::UnexpectedPayload {
                context: kind.as_str(),
            })?;

        let event = match kind {
            EventKind::ConversationUpdated => {
                Self::ConversationUpdated(serde_json::from_value(payload)?)
            }
            EventKind::MessageNew => Self::MessageNew(serde_json::from_value(payload)?),
            EventKind::MessageRead => Self::MessageRead(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Encode as an EVENT packet. Used by test servers and tooling.
    pub fn to_packet(&self) -> Result<Packet> {
        let payload = match self {
            Self::ConversationUpdated(update) => serde_json::to_value(update)?,
            Self::MessageNew(msg) => serde_json::to_value(msg)?,
            Self::MessageRead(receipt) => serde_json::to_value(receipt)?,
        };
        Ok(Packet::event(self.kind().as_str(), [payload]))
    }
}

/// Requests the client emits to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    /// `subscribe:conversation`
    SubscribeConversation(ConversationId),
    /// `unsubscribe:conversation`
    UnsubscribeConversation(ConversationId),
}

impl ClientEvent {
    /// Wire name of the request.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubscribeConversation(_) => "subscribe:conversation",
            Self::UnsubscribeConversation(_) => "unsubscribe:conversation",
        }
    }

    /// Conversation the request targets.
    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            Self::SubscribeConversation(id) | Self::UnsubscribeConversation(id) => id,
        }
    }

    /// Encode as an EVENT packet.
    pub fn to_packet(&self) -> Packet {
        Packet::event(
            self.name(),
            [Value::String(self.conversation_id().as_str().to_string())],
        )
    }

    /// Decode an EVENT packet sent by a client. Used by test servers.
    pub fn from_packet(packet: &Packet) -> Option<Self> {
        let id = packet.event_args().first()?.as_str()?;
        match packet.event_name()? {
            "subscribe:conversation" => Some(Self::SubscribeConversation(id.into())),
            "unsubscribe:conversation" => Some(Self::UnsubscribeConversation(id.into())),
            _ => None,
        }
    }
}

impl fmt::Display for ClientEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.conversation_id())
    }
}
