//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("endpoint.url must start with http://, https://, ws:// or wss://, got '{0}'")]
    InvalidEndpointScheme(String),
    #[error("endpoint.path must start with '/', got '{0}'")]
    InvalidSocketPath(String),
    #[error("reconnect.max_attempts must be at least 1 when reconnect is enabled")]
    ZeroAttempts,
    #[error("reconnect.max_delay_ms ({max}) is smaller than reconnect.initial_delay_ms ({initial})")]
    DelayCapBelowInitial { initial: u64, max: u64 },
    #[error("reconnect.factor must be at least 1.0, got {0}")]
    InvalidFactor(f64),
    #[error("reconnect.jitter must be within [0, 1], got {0}")]
    InvalidJitter(f64),
    #[error("timeouts.connect_ms must be greater than zero")]
    ZeroConnectTimeout,
}

/// Whether a URL uses a scheme the WebSocket transport can dial.
pub fn has_supported_scheme(url: &str) -> bool {
    ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| url.starts_with(scheme))
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(url) = config.endpoint.url.as_deref()
        && !has_supported_scheme(url)
    {
        errors.push(ValidationError::InvalidEndpointScheme(url.to_string()));
    }
    if !config.endpoint.path.starts_with('/') {
        errors.push(ValidationError::InvalidSocketPath(config.endpoint.path.clone()));
    }

    let reconnect = &config.reconnect;
    if reconnect.enabled && reconnect.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }
    if reconnect.max_delay_ms < reconnect.initial_delay_ms {
        errors.push(ValidationError::DelayCapBelowInitial {
            initial: reconnect.initial_delay_ms,
            max: reconnect.max_delay_ms,
        });
    }
    if !(reconnect.factor >= 1.0) {
        errors.push(ValidationError::InvalidFactor(reconnect.factor));
    }
    if !(0.0..=1.0).contains(&reconnect.jitter) {
        errors.push(ValidationError::InvalidJitter(reconnect.jitter));
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
