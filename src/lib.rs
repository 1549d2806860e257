//! contactio-realtime - realtime messaging layer of the ClientContact.IO
//! unified inbox.
//!
//! A [`RealtimeClient`] keeps one push connection open, multiplexes
//! per-conversation subscriptions over it, replays them after every
//! reconnect, and hands server-pushed events to local listeners.
//!
//! ```no_run
//! use std::sync::Arc;
//! use contactio_realtime::{ClientSettings, EventKind, Listener, RealtimeClient};
//! use contactio_realtime::token::EnvToken;
//! use contactio_realtime::transport::WebSocketTransport;
//!
//! # async fn run() {
//! let client = Arc::new(RealtimeClient::new(
//!     ClientSettings::default(),
//!     Arc::new(WebSocketTransport::new()),
//!     Arc::new(EnvToken::new("CONTACTIO_TOKEN")),
//! ));
//! client.on(EventKind::MessageNew, Listener::new(|event| println!("{:?}", event)));
//! client.subscribe_to_conversation("conv-1");
//! client.connect(None);
//! # }
//! ```

pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod listeners;
pub mod metrics;
pub mod state;
pub mod subscriptions;
pub mod telemetry;
pub mod token;
pub mod transport;

pub use backoff::ReconnectPolicy;
pub use client::{ClientSettings, RealtimeClient};
pub use error::TransportError;
pub use events::Event;
pub use listeners::{Listener, ListenerRegistry};
pub use state::ConnectionState;

pub use contactio_proto::{
    ClientEvent, ConversationId, ConversationUpdate, DisconnectReason, EventKind, NewMessage,
    ReadReceipt, ServerEvent,
};
