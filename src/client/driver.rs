//! The connection task.
//!
//! One task per `connect()`. It opens sessions, replays subscriptions,
//! pumps commands and events, and reconnects with backoff until it gives
//! up or `disconnect()` fires the shutdown signal. Every write to shared
//! state is tagged with the task's epoch so a task that has been replaced
//! cannot clobber its successor.

use std::sync::Arc;
use std::time::Duration;

use contactio_proto::{ClientEvent, ConversationId, DisconnectReason};
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug, info, warn};

use super::{Command, Inner};
use crate::events::Event;
use crate::metrics;
use crate::state::ConnectionState;
use crate::telemetry::{ConnectTimer, spans};
use crate::transport::{ConnectRequest, LinkStatus, TransportSession};

pub(super) struct ConnectionTask {
    inner: Arc<Inner>,
    epoch: u64,
    token: String,
    commands: mpsc::UnboundedReceiver<Command>,
    shutdown: oneshot::Receiver<()>,
}

impl ConnectionTask {
    pub(super) fn new(
        inner: Arc<Inner>,
        epoch: u64,
        token: String,
        commands: mpsc::UnboundedReceiver<Command>,
        shutdown: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            inner,
            epoch,
            token,
            commands,
            shutdown,
        }
    }

    pub(super) async fn run(mut self) {
        let request = ConnectRequest {
            url: self.inner.settings.endpoint.clone(),
            token: std::mem::take(&mut self.token),
            timeout: self.inner.settings.connect_timeout,
        };
        let policy = self.inner.settings.reconnect.clone();
        let mut failures: u32 = 0;
        // Position in the backoff schedule. Shared by retries after a failed
        // open and after a drop, reset only by a successful open.
        let mut step: u32 = 0;

        'reconnect: loop {
            if !self.mark_connecting() {
                return;
            }

            let mut timer = ConnectTimer::new();
            let opened = tokio::select! {
                biased;
                _ = &mut self.shutdown => {
                    debug!("Shutdown while connecting");
                    return;
                }
                result = self
                    .inner
                    .transport
                    .open(&request)
                    .instrument(spans::attempt(failures + 1)) => result,
            };

            let mut session = match opened {
                Ok(session) => {
                    timer.succeeded();
                    session
                }
                Err(e) => {
                    drop(timer);
                    failures += 1;
                    let will_retry = policy.allows_retry(failures);
                    warn!(
                        attempt = failures,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "Connection attempt failed"
                    );
                    metrics::record_connect_error(e.error_code());

                    if !will_retry {
                        warn!(attempts = failures, "Giving up, call connect() to try again");
                        self.finish();
                    }
                    self.inner.listeners.dispatch(&Event::ConnectError {
                        message: e.to_string(),
                        will_retry,
                    });
                    if !will_retry || !self.backoff(policy.delay_for(step)).await {
                        return;
                    }
                    step += 1;
                    continue 'reconnect;
                }
            };
            drop(timer);
            failures = 0;
            step = 0;

            let Some(replay) = self.mark_connected(session.status()) else {
                session.close().await;
                return;
            };

            let (reason, announced) = match replay_subscriptions(session.as_mut(), replay).await {
                Ok(count) => {
                    info!(replayed = count, "Connected");
                    let announced = self.mark_announced();
                    if announced {
                        self.inner.listeners.dispatch(&Event::Connect);
                    }
                    match self.pump(session.as_mut()).await {
                        Some(reason) => (reason, announced),
                        None => return,
                    }
                }
                Err(reason) => (reason, false),
            };
            drop(session);

            let retry = policy.enabled && reason.should_reconnect();
            if !self.mark_dropped(retry) {
                return;
            }
            while self.commands.try_recv().is_ok() {}

            metrics::record_disconnect(reason.as_str());
            if retry {
                warn!(reason = %reason, "Connection lost, reconnecting");
            } else {
                info!(reason = %reason, "Connection closed");
            }
            if announced {
                self.inner.listeners.dispatch(&Event::Disconnect { reason });
            }

            if !retry || !self.backoff(policy.delay_for(step)).await {
                return;
            }
            step += 1;
        }
    }

    /// Move commands out and events in until the session ends.
    ///
    /// Returns `None` when the task was told to stop.
    async fn pump(&mut self, session: &mut dyn TransportSession) -> Option<DisconnectReason> {
        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown => {
                    session.close().await;
                    return None;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        session.close().await;
                        return None;
                    };
                    let event = command.into_event();
                    let name = event.name();
                    debug!(event = %event, "Emitting");
                    if let Err(e) = session.emit(event).await {
                        warn!(error = %e, "Failed to emit");
                        return Some(DisconnectReason::TransportError);
                    }
                    metrics::record_event_emitted(name);
                }
                received = session.recv() => match received {
                    Ok(event) => {
                        metrics::record_event_received(event.kind().as_str());
                        self.inner.listeners.dispatch(&Event::from(event));
                    }
                    Err(reason) => return Some(reason),
                },
            }
        }
    }

    /// Sleep before the next attempt. Returns `false` if told to stop.
    async fn backoff(&mut self, delay: Duration) -> bool {
        debug!(delay_ms = delay.as_millis() as u64, "Waiting before reconnect");
        tokio::select! {
            biased;
            _ = &mut self.shutdown => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Record that `Connect` goes out for this session. From here on
    /// `disconnect()` owes listeners the matching `Disconnect`.
    fn mark_announced(&self) -> bool {
        self.inner
            .with_current(self.epoch, |core| {
                if let Some(handle) = core.session.as_mut() {
                    handle.announced = true;
                }
            })
            .is_some()
    }

    fn mark_connecting(&self) -> bool {
        self.inner
            .with_current(self.epoch, |core| core.set_state(ConnectionState::Connecting))
            .is_some()
    }

    /// Flip to connected and take the replay snapshot under the same lock
    /// `subscribe_to_conversation` uses, so each id is either replayed here
    /// or sent as a command afterwards, never both.
    fn mark_connected(&self, link: LinkStatus) -> Option<Vec<ConversationId>> {
        self.inner.with_current(self.epoch, |core| {
            if let Some(handle) = core.session.as_mut() {
                handle.link = Some(link);
            }
            core.set_state(ConnectionState::Connected);
            core.subscriptions.snapshot()
        })
    }

    fn mark_dropped(&self, retry: bool) -> bool {
        self.inner
            .with_current(self.epoch, |core| {
                core.set_state(ConnectionState::Disconnected);
                if retry {
                    if let Some(handle) = core.session.as_mut() {
                        handle.link = None;
                        handle.announced = false;
                    }
                } else {
                    core.session = None;
                }
            })
            .is_some()
    }

    fn finish(&self) {
        self.inner.with_current(self.epoch, |core| {
            core.session = None;
            core.gave_up = true;
            core.set_state(ConnectionState::Disconnected);
        });
    }
}

/// Send a subscribe for every tracked id before anything is read.
async fn replay_subscriptions(
    session: &mut dyn TransportSession,
    ids: Vec<ConversationId>,
) -> Result<usize, DisconnectReason> {
    let mut sent = 0;
    for id in ids {
        let event = ClientEvent::SubscribeConversation(id);
        let name = event.name();
        if let Err(e) = session.emit(event).await {
            warn!(error = %e, replayed = sent, "Replay interrupted");
            metrics::record_replay(sent);
            return Err(DisconnectReason::TransportError);
        }
        metrics::record_event_emitted(name);
        sent += 1;
    }
    metrics::record_replay(sent);
    Ok(sent)
}
