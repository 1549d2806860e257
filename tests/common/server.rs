//! Minimal Socket.IO server for end-to-end transport tests.
//!
//! Speaks just enough Engine.IO v4 / Socket.IO v5 to exercise the client:
//! open handshake, namespace connect with token auth, optional heartbeats,
//! and EVENT packets in both directions.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use contactio_proto::{ClientEvent, EnginePacket, OpenInfo, Packet, PacketKind, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub ping_interval: Duration,
    pub ping_timeout: Duration,
    /// Send heartbeats every `ping_interval`.
    pub send_pings: bool,
    /// Answer CONNECT with CONNECT_ERROR for this token.
    pub reject_token: Option<String>,
    /// Answer CONNECT with an Engine.IO close packet and keep the socket open.
    pub close_on_connect: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(25),
            ping_timeout: Duration::from_secs(20),
            send_pings: false,
            reject_token: None,
            close_on_connect: false,
        }
    }
}

enum Outbound {
    Frame(String),
    Close,
}

#[derive(Default)]
struct ServerState {
    connections: usize,
    tokens: Vec<String>,
    received: Vec<ClientEvent>,
    pings: usize,
    pongs: usize,
    client_disconnects: usize,
    live: Option<mpsc::UnboundedSender<Outbound>>,
}

pub struct TestServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

#[allow(dead_code)]
impl TestServer {
    pub async fn spawn(options: ServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(ServerState::default()));

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&accept_state);
                let options = options.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, state, options).await;
                });
            }
        });

        Ok(Self { addr, state })
    }

    /// Endpoint URL for the client, in the `http://` form the app uses.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Completed namespace connects.
    pub fn connections(&self) -> usize {
        self.state.lock().connections
    }

    pub fn tokens(&self) -> Vec<String> {
        self.state.lock().tokens.clone()
    }

    pub fn received(&self) -> Vec<String> {
        self.state
            .lock()
            .received
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.state.lock().pings
    }

    pub fn pongs(&self) -> usize {
        self.state.lock().pongs
    }

    pub fn client_disconnects(&self) -> usize {
        self.state.lock().client_disconnects
    }

    /// Send a raw Socket.IO packet (without the Engine.IO `4` prefix) to the
    /// latest connection.
    pub fn send_packet(&self, packet: &str) -> bool {
        self.send(Outbound::Frame(EnginePacket::Message(packet.to_string()).encode()))
    }

    pub fn push(&self, event: &ServerEvent) -> bool {
        match event.to_packet() {
            Ok(packet) => self.send_packet(&packet.encode()),
            Err(_) => false,
        }
    }

    /// Namespace disconnect from the server side (`41`).
    pub fn kick(&self) -> bool {
        self.send_packet(&Packet::disconnect().encode())
    }

    /// Close the WebSocket without any Socket.IO goodbye.
    pub fn drop_connection(&self) -> bool {
        self.send(Outbound::Close)
    }

    fn send(&self, outbound: Outbound) -> bool {
        match &self.state.lock().live {
            Some(tx) => tx.send(outbound).is_ok(),
            None => false,
        }
    }
}

async fn serve(
    stream: TcpStream,
    state: Arc<Mutex<ServerState>>,
    options: ServerOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ws = accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();

    let open = EnginePacket::Open(OpenInfo {
        sid: "test-sid".to_string(),
        upgrades: Vec::new(),
        ping_interval: options.ping_interval.as_millis() as u64,
        ping_timeout: options.ping_timeout.as_millis() as u64,
        max_payload: Some(1_000_000),
    });
    sink.send(WsMessage::Text(open.encode())).await?;

    // Namespace connect with auth payload.
    let token = loop {
        let Some(frame) = source.next().await else {
            return Ok(());
        };
        let WsMessage::Text(text) = frame? else {
            continue;
        };
        let EnginePacket::Message(body) = EnginePacket::parse(&text)? else {
            continue;
        };
        let packet = Packet::parse(&body)?;
        if packet.kind == PacketKind::Connect {
            break packet
                .data
                .as_ref()
                .and_then(|auth| auth.get("token"))
                .and_then(|token| token.as_str())
                .unwrap_or_default()
                .to_string();
        }
    };

    if options.close_on_connect {
        sink.send(WsMessage::Text(EnginePacket::Close.encode())).await?;
        while let Some(Ok(frame)) = source.next().await {
            if matches!(frame, WsMessage::Close(_)) {
                break;
            }
        }
        return Ok(());
    }

    if options.reject_token.as_deref() == Some(token.as_str()) {
        let refusal = EnginePacket::Message(r#"4{"message":"Authentication error"}"#.to_string());
        sink.send(WsMessage::Text(refusal.encode())).await?;
        let _ = sink.close().await;
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    {
        let mut state = state.lock();
        state.connections += 1;
        state.tokens.push(token);
        state.live = Some(tx);
    }
    sink.send(WsMessage::Text(
        EnginePacket::Message(r#"0{"sid":"ns-sid"}"#.to_string()).encode(),
    ))
    .await?;

    let mut heartbeat = tokio::time::interval(options.ping_interval);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(Outbound::Frame(frame)) => sink.send(WsMessage::Text(frame)).await?,
                Some(Outbound::Close) | None => {
                    let _ = sink.close().await;
                    return Ok(());
                }
            },
            _ = heartbeat.tick(), if options.send_pings => {
                state.lock().pings += 1;
                sink.send(WsMessage::Text(EnginePacket::Ping(None).encode())).await?;
            }
            frame = source.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                let text = match frame? {
                    WsMessage::Text(text) => text,
                    WsMessage::Close(_) => return Ok(()),
                    _ => continue,
                };
                match EnginePacket::parse(&text)? {
                    EnginePacket::Pong(_) => state.lock().pongs += 1,
                    EnginePacket::Message(body) => {
                        let packet = Packet::parse(&body)?;
                        match packet.kind {
                            PacketKind::Event => {
                                if let Some(event) = ClientEvent::from_packet(&packet) {
                                    state.lock().received.push(event);
                                }
                            }
                            PacketKind::Disconnect => state.lock().client_disconnects += 1,
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}
