//! Events delivered to local listeners.

use contactio_proto::{
    ConversationUpdate, DisconnectReason, EventKind, NewMessage, ReadReceipt, ServerEvent,
};

/// Everything a listener can observe: connection lifecycle plus the
/// server-pushed inbox events.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A session was opened and subscriptions were replayed.
    Connect,
    /// The session ended.
    Disconnect { reason: DisconnectReason },
    /// An attempt to open a session failed. `will_retry` is `false` on the
    /// attempt after which the client gives up.
    ConnectError { message: String, will_retry: bool },
    ConversationUpdated(ConversationUpdate),
    MessageNew(NewMessage),
    MessageRead(ReadReceipt),
}

impl Event {
    /// Registry key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect => EventKind::Connect,
            Self::Disconnect { .. } => EventKind::Disconnect,
            Self::ConnectError { .. } => EventKind::ConnectError,
            Self::ConversationUpdated(_) => EventKind::ConversationUpdated,
            Self::MessageNew(_) => EventKind::MessageNew,
            Self::MessageRead(_) => EventKind::MessageRead,
        }
    }
}

impl From<ServerEvent> for Event {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::ConversationUpdated(update) => Self::ConversationUpdated(update),
            ServerEvent::MessageNew(msg) => Self::MessageNew(msg),
            ServerEvent::MessageRead(receipt) => Self::MessageRead(receipt),
        }
    }
}
