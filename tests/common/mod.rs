//! Integration test common infrastructure.
//!
//! Provides an in-memory transport for driving the connection manager, a
//! minimal Socket.IO server for end-to-end WebSocket tests, and polling
//! helpers.

pub mod mock;
pub mod server;

#[allow(unused_imports)]
pub use mock::MockTransport;
#[allow(unused_imports)]
pub use server::{ServerOptions, TestServer};

use std::sync::Arc;
use std::time::Duration;

use contactio_realtime::token::StaticToken;
use contactio_realtime::{
    ClientSettings, EventKind, Listener, NewMessage, RealtimeClient, ReconnectPolicy, ServerEvent,
};
use parking_lot::Mutex;

/// Poll `condition` until it holds, panicking after two seconds.
#[allow(dead_code)]
pub async fn eventually<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if condition() {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Reconnect policy with millisecond delays and no jitter.
#[allow(dead_code)]
pub fn fast_policy(max_attempts: u32) -> ReconnectPolicy {
    ReconnectPolicy {
        enabled: true,
        max_attempts,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
        factor: 2.0,
        jitter: 0.0,
    }
}

#[allow(dead_code)]
pub fn settings(endpoint: &str, reconnect: ReconnectPolicy) -> ClientSettings {
    ClientSettings {
        endpoint: endpoint.to_string(),
        reconnect,
        connect_timeout: Duration::from_secs(2),
    }
}

/// A client on top of `mock` that authenticates with `"test-token"`.
#[allow(dead_code)]
pub fn mock_client(mock: &Arc<MockTransport>, reconnect: ReconnectPolicy) -> RealtimeClient {
    RealtimeClient::new(
        settings("http://mock.invalid", reconnect),
        mock.clone(),
        Arc::new(StaticToken("test-token".to_string())),
    )
}

/// Register a listener for every kind that writes each event to the mock's
/// timeline, interleaved with emits.
#[allow(dead_code)]
pub fn record_on_timeline(client: &RealtimeClient, mock: &Arc<MockTransport>) {
    for kind in EventKind::ALL {
        let transport = Arc::clone(mock);
        client.on(
            kind,
            Listener::new(move |event| transport.note(mock::describe(event))),
        );
    }
}

/// Register a listener for every kind and return the log it writes to.
#[allow(dead_code)]
pub fn event_log(client: &RealtimeClient) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let log = Arc::clone(&log);
        client.on(
            kind,
            Listener::new(move |event| log.lock().push(mock::describe(event))),
        );
    }
    log
}

#[allow(dead_code)]
pub fn new_message(conversation: &str, content: &str) -> ServerEvent {
    ServerEvent::MessageNew(NewMessage {
        conversation_id: conversation.into(),
        message_id: Some(format!("{}-msg", conversation)),
        content: Some(content.to_string()),
        extra: Default::default(),
    })
}
