//! In-memory transport.
//!
//! Every open creates a session fed through a channel the test controls.
//! Emits and listener callbacks can be written to one shared timeline so
//! tests can assert on ordering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use contactio_realtime::error::TransportError;
use contactio_realtime::transport::{ConnectRequest, LinkStatus, Transport, TransportSession};
use contactio_realtime::{ClientEvent, DisconnectReason, Event, ServerEvent};
use parking_lot::Mutex;
use tokio::sync::mpsc;

type Inbound = Result<ServerEvent, DisconnectReason>;

/// Short description of an event, as written to timelines.
pub fn describe(event: &Event) -> String {
    match event {
        Event::Connect => "event connect".to_string(),
        Event::Disconnect { reason } => format!("event disconnect {}", reason),
        Event::ConnectError { message, .. } => format!("event connect_error {}", message),
        Event::ConversationUpdated(update) => {
            format!("event conversation:updated {}", update.conversation_id)
        }
        Event::MessageNew(msg) => format!("event message:new {}", msg.conversation_id),
        Event::MessageRead(receipt) => format!("event message:read {}", receipt.conversation_id),
    }
}

struct LiveSession {
    inbound: mpsc::UnboundedSender<Inbound>,
    status: LinkStatus,
}

#[derive(Default)]
struct MockState {
    fail_next: usize,
    fail_always: bool,
    opens: usize,
    open_times: Vec<Instant>,
    emit_delay: Option<Duration>,
    sessions: usize,
    closes: usize,
    tokens: Vec<String>,
    /// `(session number, "name id")` for every emit.
    emitted: Vec<(usize, String)>,
    queued: Vec<ServerEvent>,
    live: Option<LiveSession>,
    timeline: Vec<String>,
}

type Shared = Arc<Mutex<MockState>>;

#[derive(Default)]
pub struct MockTransport {
    state: Shared,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append an entry to the shared timeline.
    pub fn note(&self, entry: String) {
        self.state.lock().timeline.push(entry);
    }

    pub fn timeline(&self) -> Vec<String> {
        self.state.lock().timeline.clone()
    }

    /// Fail the next `n` opens.
    pub fn fail_next(&self, n: usize) {
        self.state.lock().fail_next = n;
    }

    /// Fail every open until turned off.
    pub fn fail_always(&self, fail: bool) {
        self.state.lock().fail_always = fail;
    }

    /// Open attempts, failed ones included.
    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    /// When each open attempt happened.
    pub fn open_times(&self) -> Vec<Instant> {
        self.state.lock().open_times.clone()
    }

    /// Make every emit take `delay` before it lands.
    pub fn slow_emits(&self, delay: Duration) {
        self.state.lock().emit_delay = Some(delay);
    }

    /// Sessions closed by the client.
    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }

    pub fn tokens(&self) -> Vec<String> {
        self.state.lock().tokens.clone()
    }

    /// Every emit so far, as `"name id"`.
    pub fn emitted(&self) -> Vec<String> {
        self.state
            .lock()
            .emitted
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Emits made on the `session`-th successful open (1-based).
    pub fn emitted_in_session(&self, session: usize) -> Vec<String> {
        self.state
            .lock()
            .emitted
            .iter()
            .filter(|(n, _)| *n == session)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Deliver `event` on the next session before anything pushed later.
    pub fn queue_on_open(&self, event: ServerEvent) {
        self.state.lock().queued.push(event);
    }

    /// Push an event on the live session. Returns `false` if none is open.
    pub fn push(&self, event: ServerEvent) -> bool {
        match &self.state.lock().live {
            Some(live) => live.inbound.send(Ok(event)).is_ok(),
            None => false,
        }
    }

    /// Kill the live session as the network would: the link reads closed
    /// immediately and the next `recv` reports `reason`.
    pub fn drop_connection(&self, reason: DisconnectReason) -> bool {
        match self.state.lock().live.take() {
            Some(live) => {
                live.status.mark_closed();
                live.inbound.send(Err(reason)).is_ok()
            }
            None => false,
        }
    }

    pub fn has_live_session(&self) -> bool {
        self.state
            .lock()
            .live
            .as_ref()
            .is_some_and(|live| live.status.is_open())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(
        &self,
        request: &ConnectRequest,
    ) -> Result<Box<dyn TransportSession>, TransportError> {
        let mut state = self.state.lock();
        state.opens += 1;
        state.open_times.push(Instant::now());
        state.tokens.push(request.token.clone());

        if state.fail_always {
            return Err(TransportError::Rejected("mock refused".to_string()));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(TransportError::Rejected("mock refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        for event in state.queued.drain(..) {
            let _ = tx.send(Ok(event));
        }
        let status = LinkStatus::open();
        state.sessions += 1;
        state.live = Some(LiveSession {
            inbound: tx,
            status: status.clone(),
        });

        Ok(Box::new(MockSession {
            number: state.sessions,
            inbound: rx,
            status,
            shared: Arc::clone(&self.state),
        }))
    }
}

struct MockSession {
    number: usize,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    status: LinkStatus,
    shared: Shared,
}

#[async_trait]
impl TransportSession for MockSession {
    async fn emit(&mut self, event: ClientEvent) -> Result<(), TransportError> {
        let delay = self.shared.lock().emit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if !self.status.is_open() {
            return Err(TransportError::Closed("mock session closed".to_string()));
        }
        let line = event.to_string();
        let mut state = self.shared.lock();
        state.timeline.push(format!("emit {}", line));
        state.emitted.push((self.number, line));
        Ok(())
    }

    async fn recv(&mut self) -> Result<ServerEvent, DisconnectReason> {
        match self.inbound.recv().await {
            Some(Ok(event)) => Ok(event),
            Some(Err(reason)) => {
                self.status.mark_closed();
                Err(reason)
            }
            None => {
                self.status.mark_closed();
                Err(DisconnectReason::TransportClose)
            }
        }
    }

    async fn close(&mut self) {
        self.status.mark_closed();
        let mut state = self.shared.lock();
        state.closes += 1;
        state.timeline.push("close".to_string());
    }

    fn status(&self) -> LinkStatus {
        self.status.clone()
    }
}
