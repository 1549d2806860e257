//! Realtime connection manager.
//!
//! [`RealtimeClient`] keeps at most one push session open, tracks which
//! conversations the application wants pushes for, replays those
//! subscriptions on every (re)connect, and fans incoming events out to
//! local listeners.
//!
//! All public methods are synchronous and cheap. Network work happens on a
//! connection task spawned by [`RealtimeClient::connect`]; the task and the
//! public methods share one small piece of state behind a mutex.

mod driver;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use contactio_proto::{ClientEvent, ConversationId, DisconnectReason, EventKind};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, error, info, warn};

use crate::backoff::ReconnectPolicy;
use crate::config::{self, Config};
use crate::events::Event;
use crate::listeners::{Listener, ListenerRegistry};
use crate::metrics;
use crate::state::ConnectionState;
use crate::subscriptions::SubscriptionSet;
use crate::telemetry::spans;
use crate::token::TokenSource;
use crate::transport::{LinkStatus, Transport, WebSocketTransport};

use driver::ConnectionTask;

/// Connection parameters of a client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Push endpoint base URL.
    pub endpoint: String,
    pub reconnect: ReconnectPolicy,
    /// Upper bound for one handshake.
    pub connect_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: config::DEFAULT_ENDPOINT.to_string(),
            reconnect: ReconnectPolicy::default(),
            connect_timeout: Duration::from_secs(20),
        }
    }
}

impl ClientSettings {
    /// Settings from a loaded config, resolving the endpoint against the
    /// process environment.
    pub fn from_config(config: &Config) -> Self {
        Self {
            endpoint: config::resolve_endpoint_from_env(config.endpoint.url.as_deref()),
            reconnect: ReconnectPolicy::from(&config.reconnect),
            connect_timeout: Duration::from_millis(config.timeouts.connect_ms),
        }
    }
}

/// Requests from the public API to the live session.
#[derive(Debug)]
enum Command {
    Subscribe(ConversationId),
    Unsubscribe(ConversationId),
}

impl Command {
    fn into_event(self) -> ClientEvent {
        match self {
            Self::Subscribe(id) => ClientEvent::SubscribeConversation(id),
            Self::Unsubscribe(id) => ClientEvent::UnsubscribeConversation(id),
        }
    }
}

/// Handle to the running connection task.
struct SessionHandle {
    epoch: u64,
    commands: mpsc::UnboundedSender<Command>,
    /// Dropping or firing this stops the task.
    shutdown: oneshot::Sender<()>,
    /// Liveness of the open session, if one is open.
    link: Option<LinkStatus>,
    /// `Connect` was dispatched for the open session.
    announced: bool,
}

struct Core {
    state: ConnectionState,
    subscriptions: SubscriptionSet,
    session: Option<SessionHandle>,
    next_epoch: u64,
    /// The last task ended by exhausting its attempts.
    gave_up: bool,
}

impl Core {
    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        metrics::set_connection_state(state);
    }
}

struct Inner {
    settings: ClientSettings,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenSource>,
    core: Mutex<Core>,
    listeners: ListenerRegistry,
}

impl Inner {
    /// Run `f` only if `epoch` still owns the session.
    fn with_current<R>(&self, epoch: u64, f: impl FnOnce(&mut Core) -> R) -> Option<R> {
        let mut core = self.core.lock();
        let current = core.session.as_ref().is_some_and(|h| h.epoch == epoch);
        if !current {
            return None;
        }
        Some(f(&mut *core))
    }
}

/// The realtime connection manager.
///
/// Construct one per signed-in session and share it with `Arc`. Dropping
/// the client disconnects it.
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl RealtimeClient {
    pub fn new(
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                transport,
                tokens,
                core: Mutex::new(Core {
                    state: ConnectionState::Disconnected,
                    subscriptions: SubscriptionSet::new(),
                    session: None,
                    next_epoch: 1,
                    gave_up: false,
                }),
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    /// A client speaking Socket.IO over WebSocket, configured from `config`.
    pub fn from_config(config: &Config, tokens: Arc<dyn TokenSource>) -> Self {
        let transport = WebSocketTransport::with_path(config.endpoint.path.clone());
        Self::new(ClientSettings::from_config(config), Arc::new(transport), tokens)
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    /// Start a session unless one is already running.
    ///
    /// `token` overrides the configured token source. Without a usable token
    /// nothing happens beyond a warning. Must be called from within a tokio
    /// runtime.
    pub fn connect(&self, token: Option<&str>) {
        if self.inner.core.lock().session.is_some() {
            debug!("connect() ignored, session already active");
            return;
        }

        let token = token
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| self.inner.tokens.token().filter(|t| !t.is_empty()));
        let Some(token) = token else {
            warn!("No session token available, not connecting");
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!("connect() called outside a tokio runtime");
            return;
        };

        let mut core = self.inner.core.lock();
        if core.session.is_some() {
            return;
        }

        let epoch = core.next_epoch;
        core.next_epoch += 1;
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        core.session = Some(SessionHandle {
            epoch,
            commands: commands_tx,
            shutdown: shutdown_tx,
            link: None,
            announced: false,
        });
        core.gave_up = false;
        core.set_state(ConnectionState::Connecting);

        let task = ConnectionTask::new(Arc::clone(&self.inner), epoch, token, commands_rx, shutdown_rx);
        let span = spans::session(&self.inner.settings.endpoint, epoch);
        runtime.spawn(task.run().instrument(span));
        info!(endpoint = %self.inner.settings.endpoint, epoch, "Connecting");
    }

    /// Tear down the session and stop reconnecting. Safe to call repeatedly.
    pub fn disconnect(&self) {
        let was_connected = {
            let mut core = self.inner.core.lock();
            core.gave_up = false;
            let Some(handle) = core.session.take() else {
                return;
            };
            let was_connected = handle.announced;
            core.set_state(ConnectionState::Disconnected);
            let _ = handle.shutdown.send(());
            was_connected
        };

        info!("Disconnected by client");
        if was_connected {
            let reason = DisconnectReason::IoClientDisconnect;
            metrics::record_disconnect(reason.as_str());
            self.inner.listeners.dispatch(&Event::Disconnect { reason });
        }
    }

    /// Whether a session is open right now.
    pub fn is_connected(&self) -> bool {
        let core = self.inner.core.lock();
        core.state == ConnectionState::Connected
            && core.session.as_ref().is_some_and(|h| {
                h.announced && h.link.as_ref().is_some_and(LinkStatus::is_open)
            })
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.core.lock().state
    }

    /// Call `connect(None)` again `delay` after the client gives up on its
    /// retries. A `disconnect()` or `connect()` in the meantime cancels the
    /// restart.
    pub fn restart_after_give_up(self: &Arc<Self>, delay: Duration) {
        let client = Arc::downgrade(self);
        self.on(
            EventKind::ConnectError,
            Listener::new(move |event| {
                if !matches!(event, Event::ConnectError { will_retry: false, .. }) {
                    return;
                }
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    return;
                };
                info!(delay_ms = delay.as_millis() as u64, "Scheduling restart");
                let client = client.clone();
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Some(client) = client.upgrade() {
                        client.restart();
                    }
                });
            }),
        );
    }

    fn restart(&self) {
        if !self.inner.core.lock().gave_up {
            debug!("Restart skipped, client was reconnected or disconnected");
            return;
        }
        info!("Restarting after give-up");
        self.connect(None);
    }

    /// Follow a conversation. Sent immediately when connected, otherwise on
    /// the next connect.
    pub fn subscribe_to_conversation(&self, id: impl Into<ConversationId>) {
        let id = id.into();
        let mut core = self.inner.core.lock();
        if !core.subscriptions.insert(id.clone()) {
            return;
        }
        debug!(conversation = %id, "Subscribed");
        if core.state == ConnectionState::Connected
            && let Some(handle) = &core.session
        {
            let _ = handle.commands.send(Command::Subscribe(id));
        }
    }

    /// Stop following a conversation.
    pub fn unsubscribe_from_conversation(&self, id: impl Into<ConversationId>) {
        let id = id.into();
        let mut core = self.inner.core.lock();
        if !core.subscriptions.remove(&id) {
            return;
        }
        debug!(conversation = %id, "Unsubscribed");
        if core.state == ConnectionState::Connected
            && let Some(handle) = &core.session
        {
            let _ = handle.commands.send(Command::Unsubscribe(id));
        }
    }

    /// Tracked conversations, sorted.
    pub fn subscriptions(&self) -> Vec<ConversationId> {
        self.inner.core.lock().subscriptions.snapshot()
    }

    /// Register a listener. Listeners survive reconnects.
    pub fn on(&self, kind: EventKind, listener: Listener) {
        self.inner.listeners.add(kind, listener);
    }

    /// Remove the first registration of `listener` for `kind`.
    pub fn off(&self, kind: EventKind, listener: &Listener) -> bool {
        self.inner.listeners.remove(kind, listener)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.listeners.count(kind)
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.core.lock();
        f.debug_struct("RealtimeClient")
            .field("endpoint", &self.inner.settings.endpoint)
            .field("state", &core.state)
            .field("subscriptions", &core.subscriptions.len())
            .finish()
    }
}
