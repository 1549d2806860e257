//! contactio-rt - headless ClientContact.IO inbox listener.
//!
//! Connects to the push endpoint, follows the configured conversations and
//! logs every inbox event until interrupted.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use contactio_realtime::config::{self, Config};
use contactio_realtime::token::{EnvToken, FileToken, TokenSource};
use contactio_realtime::{Event, EventKind, Listener, RealtimeClient, http, metrics};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "contactio.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let explicit_path = std::env::args().nth(1);
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = if explicit_path.is_none() && !Path::new(&config_path).exists() {
        info!(path = %config_path, "No config file, using defaults");
        Config::default()
    } else {
        Config::load(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    };

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s), see messages above",
            errors.len()
        ));
    }

    // Prometheus metrics are optional.
    if let Some(port) = config.metrics.port {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(port).await;
        });
        info!(port, "Prometheus HTTP server started");
    } else {
        info!("Metrics disabled");
    }

    let tokens: Arc<dyn TokenSource> = match &config.auth.token_file {
        Some(path) => Arc::new(FileToken::new(path)),
        None => Arc::new(EnvToken::new(config.auth.token_env.clone())),
    };

    let client = Arc::new(RealtimeClient::from_config(&config, tokens));
    info!(endpoint = %client.settings().endpoint, "Starting contactio-rt");

    for kind in EventKind::ALL {
        client.on(kind, Listener::new(log_event));
    }
    for id in &config.subscriptions.conversations {
        client.subscribe_to_conversation(id.as_str());
    }
    if config.reconnect.restart_after_ms > 0 {
        client.restart_after_give_up(Duration::from_millis(config.reconnect.restart_after_ms));
    }

    client.connect(None);
    if client.state() == contactio_realtime::ConnectionState::Disconnected {
        warn!("Not connected; set a token via auth.token_file or the token environment variable");
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    client.disconnect();

    Ok(())
}

fn log_event(event: &Event) {
    match event {
        Event::Connect => info!("Connected to push endpoint"),
        Event::Disconnect { reason } => info!(reason = %reason, "Disconnected"),
        Event::ConnectError {
            message,
            will_retry,
        } => warn!(error = %message, will_retry, "Connect error"),
        Event::ConversationUpdated(update) => {
            info!(conversation = %update.conversation_id, fields = update.extra.len(), "conversation:updated")
        }
        Event::MessageNew(msg) => info!(
            conversation = %msg.conversation_id,
            message = msg.message_id.as_deref().unwrap_or("-"),
            content = msg.content.as_deref().unwrap_or(""),
            "message:new"
        ),
        Event::MessageRead(receipt) => info!(
            conversation = %receipt.conversation_id,
            message = receipt.message_id.as_deref().unwrap_or("-"),
            user = receipt.user_id.as_deref().unwrap_or("-"),
            "message:read"
        ),
    }
}
