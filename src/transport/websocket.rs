//! Socket.IO over WebSocket.
//!
//! Implements the subset of Engine.IO v4 / Socket.IO v5 the inbox server
//! speaks: WebSocket transport only (no long-polling, no upgrades), the root
//! namespace, text packets, and server-driven heartbeats.

use std::time::Duration;

use async_trait::async_trait;
use contactio_proto::{
    ClientEvent, DisconnectReason, ENGINE_PROTOCOL, EnginePacket, OpenInfo, Packet, PacketKind,
    ROOT_NAMESPACE, ServerEvent,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use super::{ConnectRequest, LinkStatus, Transport, TransportSession};
use crate::error::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default Socket.IO mount path.
pub const DEFAULT_PATH: &str = "/socket.io";

/// Build the WebSocket URL for an endpoint.
///
/// `http(s)` endpoints map to `ws(s)`; anything after the authority is
/// dropped, since only the root namespace is used.
pub fn socket_url(endpoint: &str, path: &str) -> Result<String, TransportError> {
    let endpoint = endpoint.trim();
    let (scheme, rest) = if let Some(rest) = endpoint.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = endpoint.strip_prefix("http://") {
        ("ws", rest)
    } else if let Some(rest) = endpoint.strip_prefix("wss://") {
        ("wss", rest)
    } else if let Some(rest) = endpoint.strip_prefix("ws://") {
        ("ws", rest)
    } else {
        return Err(TransportError::InvalidEndpoint(endpoint.to_string()));
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.is_empty() {
        return Err(TransportError::InvalidEndpoint(endpoint.to_string()));
    }

    let path = path.trim_matches('/');
    let mount = if path.is_empty() {
        String::new()
    } else {
        format!("/{}", path)
    };
    Ok(format!(
        "{}://{}{}/?EIO={}&transport=websocket",
        scheme, authority, mount, ENGINE_PROTOCOL
    ))
}

/// Opens Socket.IO sessions over `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    path: String,
}

impl WebSocketTransport {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_PATH)
    }

    /// Use a non-default Socket.IO mount path.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    async fn handshake(
        &self,
        url: &str,
        token: &str,
    ) -> Result<(WsStream, OpenInfo), TransportError> {
        let (mut stream, _response) = connect_async(url).await?;

        let info = loop {
            match next_engine_packet(&mut stream).await? {
                EnginePacket::Open(info) => break info,
                other => debug!(packet = %other, "Ignoring packet before open"),
            }
        };
        debug!(sid = %info.sid, ping_interval = info.ping_interval, "Engine session opened");

        let connect = Packet::connect(Some(json!({ "token": token })));
        send_packet(&mut stream, &connect).await?;

        loop {
            let body = match next_engine_packet(&mut stream).await? {
                EnginePacket::Message(body) => body,
                EnginePacket::Close => {
                    return Err(TransportError::Closed("closed during handshake".to_string()));
                }
                _ => continue,
            };
            let packet = Packet::parse(&body)?;
            if packet.namespace != ROOT_NAMESPACE {
                debug!(packet = %packet, "Ignoring packet for another namespace");
                continue;
            }
            match packet.kind {
                PacketKind::Connect => return Ok((stream, info)),
                PacketKind::ConnectError => {
                    let reason = packet
                        .error_message()
                        .unwrap_or_else(|| "connection refused".to_string());
                    let _ = stream.close(None).await;
                    return Err(TransportError::Rejected(reason));
                }
                _ => debug!(packet = %packet, "Ignoring packet before namespace connect"),
            }
        }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(
        &self,
        request: &ConnectRequest,
    ) -> Result<Box<dyn TransportSession>, TransportError> {
        let url = socket_url(&request.url, &self.path)?;
        debug!(url = %url, "Opening websocket");

        let (stream, info) =
            match tokio::time::timeout(request.timeout, self.handshake(&url, &request.token)).await
            {
                Ok(result) => result?,
                Err(_) => return Err(TransportError::Timeout(request.timeout)),
            };

        Ok(Box::new(WebSocketSession::new(stream, info.liveness_deadline())))
    }
}

/// Read frames until the next Engine.IO packet, answering pings on the way.
async fn next_engine_packet(stream: &mut WsStream) -> Result<EnginePacket, TransportError> {
    loop {
        let text = match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => text,
            Some(Ok(WsMessage::Close(frame))) => {
                let reason = frame.map(|f| f.reason.into_owned()).unwrap_or_default();
                return Err(TransportError::Closed(reason));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(TransportError::Closed("eof".to_string())),
        };

        let packet = EnginePacket::parse(&text)?;
        match packet.reply() {
            Some(reply) => stream.send(WsMessage::Text(reply.encode())).await?,
            None => return Ok(packet),
        }
    }
}

async fn send_packet(stream: &mut WsStream, packet: &Packet) -> Result<(), TransportError> {
    let frame = EnginePacket::Message(packet.encode()).encode();
    stream.send(WsMessage::Text(frame)).await?;
    Ok(())
}

/// An open Socket.IO session.
pub struct WebSocketSession {
    stream: WsStream,
    status: LinkStatus,
    liveness: Duration,
    deadline: Instant,
    /// Heartbeat reply owed to the server, sent at the start of the next
    /// `recv`. A `recv` cancelled before the send starts keeps it owed; one
    /// cancelled mid-send drops it, and the next ping asks again.
    pending_reply: Option<EnginePacket>,
}

impl WebSocketSession {
    fn new(stream: WsStream, liveness: Duration) -> Self {
        Self {
            stream,
            status: LinkStatus::open(),
            liveness,
            deadline: Instant::now() + liveness,
            pending_reply: None,
        }
    }

    fn end(&self, reason: DisconnectReason) -> DisconnectReason {
        self.status.mark_closed();
        debug!(reason = %reason, "Session ended");
        reason
    }

    fn handle_message(&self, body: &str) -> Result<Option<ServerEvent>, DisconnectReason> {
        let packet = match Packet::parse(body) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "Undecodable packet from server");
                return Err(self.end(DisconnectReason::ParseError));
            }
        };

        if packet.namespace != ROOT_NAMESPACE {
            debug!(namespace = %packet.namespace, "Ignoring packet for another namespace");
            return Ok(None);
        }

        match packet.kind {
            PacketKind::Event => match ServerEvent::from_packet(&packet) {
                Ok(Some(event)) => Ok(Some(event)),
                Ok(None) => {
                    debug!(event = packet.event_name().unwrap_or_default(), "Skipping unknown event");
                    Ok(None)
                }
                Err(e) => {
                    warn!(
                        event = packet.event_name().unwrap_or_default(),
                        error = %e,
                        "Dropping event with malformed payload"
                    );
                    Ok(None)
                }
            },
            PacketKind::Disconnect => Err(self.end(DisconnectReason::IoServerDisconnect)),
            PacketKind::ConnectError => {
                warn!(
                    message = %packet.error_message().unwrap_or_default(),
                    "Server revoked the namespace connection"
                );
                Err(self.end(DisconnectReason::IoServerDisconnect))
            }
            PacketKind::Connect | PacketKind::Ack => {
                debug!(packet = %packet, "Ignoring packet");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl TransportSession for WebSocketSession {
    async fn emit(&mut self, event: ClientEvent) -> Result<(), TransportError> {
        if !self.status.is_open() {
            return Err(TransportError::Closed("session closed".to_string()));
        }
        if let Err(e) = send_packet(&mut self.stream, &event.to_packet()).await {
            self.status.mark_closed();
            return Err(e);
        }
        Ok(())
    }

    async fn recv(&mut self) -> Result<ServerEvent, DisconnectReason> {
        loop {
            if let Some(reply) = self.pending_reply.take()
                && let Err(e) = self.stream.send(WsMessage::Text(reply.encode())).await
            {
                debug!(error = %e, "Failed to answer heartbeat");
                return Err(self.end(DisconnectReason::TransportError));
            }

            let message = match tokio::time::timeout_at(self.deadline, self.stream.next()).await {
                Err(_) => return Err(self.end(DisconnectReason::PingTimeout)),
                Ok(None) => return Err(self.end(DisconnectReason::TransportClose)),
                Ok(Some(Err(e))) => {
                    debug!(error = %e, "WebSocket error");
                    return Err(self.end(DisconnectReason::TransportError));
                }
                Ok(Some(Ok(message))) => message,
            };

            let text = match message {
                WsMessage::Text(text) => text,
                WsMessage::Close(_) => return Err(self.end(DisconnectReason::TransportClose)),
                _ => continue,
            };
            self.deadline = Instant::now() + self.liveness;

            let packet = match EnginePacket::parse(&text) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!(error = %e, "Undecodable frame from server");
                    return Err(self.end(DisconnectReason::ParseError));
                }
            };

            match packet {
                EnginePacket::Ping(data) => self.pending_reply = Some(EnginePacket::Pong(data)),
                EnginePacket::Close => return Err(self.end(DisconnectReason::TransportClose)),
                EnginePacket::Message(body) => {
                    if let Some(event) = self.handle_message(&body)? {
                        return Ok(event);
                    }
                }
                EnginePacket::Open(_)
                | EnginePacket::Pong(_)
                | EnginePacket::Upgrade
                | EnginePacket::Noop => {}
            }
        }
    }

    async fn close(&mut self) {
        if self.status.is_open() {
            let _ = send_packet(&mut self.stream, &Packet::disconnect()).await;
        }
        self.status.mark_closed();
        let _ = self.stream.close(None).await;
    }

    fn status(&self) -> LinkStatus {
        self.status.clone()
    }
}
