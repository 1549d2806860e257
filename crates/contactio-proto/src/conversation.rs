//! Conversation identifiers and the payloads the inbox server pushes.
//!
//! Payload structs only pin down the fields the client relies on; anything
//! else the server sends is kept in `extra` so listeners can still read it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier of a unified-inbox thread.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap a raw id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ConversationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Payload of `conversation:updated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationUpdate {
    /// Conversation that changed.
    #[serde(alias = "id")]
    pub conversation_id: ConversationId,
    /// Changed fields (status, assignee, unread count, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `message:new`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Conversation the message was posted to.
    pub conversation_id: ConversationId,
    /// Server-assigned message id.
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Message body, when the channel carries text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Remaining message fields (sender, channel, attachments, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `message:read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    /// Conversation in which messages were read.
    pub conversation_id: ConversationId,
    /// Last message covered by the receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Who read it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// When it was read, as sent by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    /// Anything else in the receipt.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
