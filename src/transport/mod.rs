//! Transport seam between the connection manager and the network.
//!
//! A [`Transport`] opens authenticated sessions; a [`TransportSession`] is
//! owned by exactly one connection task and carries subscribe requests out
//! and inbox events in. The manager never touches sockets directly, which
//! keeps reconnection logic testable against an in-memory transport.

mod websocket;

pub use websocket::{WebSocketTransport, socket_url};

use crate::error::TransportError;
use async_trait::async_trait;
use contactio_proto::{ClientEvent, DisconnectReason, ServerEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Parameters for one open attempt.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    /// Endpoint base URL, e.g. `https://api.example.com`.
    pub url: String,
    /// Session token sent in the handshake auth payload.
    pub token: String,
    /// Upper bound for the whole handshake.
    pub timeout: Duration,
}

/// Shared liveness flag of a session.
///
/// The session clears it the moment it notices the link is gone, so readers
/// on other threads never see a dead session as open.
#[derive(Debug, Clone)]
pub struct LinkStatus(Arc<AtomicBool>);

impl LinkStatus {
    /// A status that starts out open.
    pub fn open() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn mark_closed(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Opens sessions to the push endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open and authenticate a session.
    async fn open(
        &self,
        request: &ConnectRequest,
    ) -> Result<Box<dyn TransportSession>, TransportError>;
}

/// One open session.
#[async_trait]
pub trait TransportSession: Send {
    /// Send a request to the server.
    async fn emit(&mut self, event: ClientEvent) -> Result<(), TransportError>;

    /// Next inbox event, or the reason the session ended.
    ///
    /// Must be cancel-safe: the connection task selects on it together with
    /// outbound commands.
    async fn recv(&mut self) -> Result<ServerEvent, DisconnectReason>;

    /// Close the session gracefully. Errors are ignored.
    async fn close(&mut self);

    /// Liveness flag shared with the manager.
    fn status(&self) -> LinkStatus;
}
