//! # contactio-proto
//!
//! Wire protocol for the ClientContact.IO realtime inbox.
//!
//! ## Features
//!
//! - Engine.IO v4 framing ([`EnginePacket`]): open handshake, heartbeats,
//!   message envelopes
//! - Socket.IO v5 packets ([`Packet`]): namespace connect with auth payload,
//!   events, connect errors
//! - Typed inbox events ([`ServerEvent`], [`ClientEvent`], [`EventKind`])
//!   with their JSON payloads
//!
//! No I/O happens here; transports feed text frames in and take text frames
//! out.
//!
//! ## Quick Start
//!
//! ```rust
//! use contactio_proto::{ClientEvent, EnginePacket, Packet, ServerEvent};
//!
//! // Outbound: subscribe to a conversation.
//! let frame = EnginePacket::Message(
//!     ClientEvent::SubscribeConversation("conv-1".into()).to_packet().encode(),
//! )
//! .encode();
//! assert_eq!(frame, r#"42["subscribe:conversation","conv-1"]"#);
//!
//! // Inbound: decode a pushed message.
//! let raw = r#"42["message:new",{"conversationId":"conv-1","content":"hi"}]"#;
//! if let EnginePacket::Message(body) = EnginePacket::parse(raw).unwrap() {
//!     let packet = Packet::parse(&body).unwrap();
//!     let event = ServerEvent::from_packet(&packet).unwrap().unwrap();
//!     assert_eq!(event.conversation_id().as_str(), "conv-1");
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod conversation;
pub mod engine;
pub mod error;
pub mod event;
pub mod packet;

pub use self::conversation::{ConversationId, ConversationUpdate, NewMessage, ReadReceipt};
pub use self::engine::{ENGINE_PROTOCOL, EnginePacket, OpenInfo};
pub use self::error::{ProtocolError, Result};
pub use self::event::{ClientEvent, DisconnectReason, EventKind, ServerEvent};
pub use self::packet::{Packet, PacketKind, ROOT_NAMESPACE};
