//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Endpoint Defaults
// =============================================================================

pub fn default_socket_path() -> String {
    "/socket.io".to_string()
}

pub fn default_token_env() -> String {
    "CONTACTIO_TOKEN".to_string()
}

// =============================================================================
// Reconnect Defaults
// =============================================================================

pub fn default_max_attempts() -> u32 {
    5
}

pub fn default_initial_delay_ms() -> u64 {
    1000
}

pub fn default_max_delay_ms() -> u64 {
    5000
}

pub fn default_backoff_factor() -> f64 {
    2.0
}

pub fn default_jitter() -> f64 {
    0.5
}

pub fn default_restart_after_ms() -> u64 {
    30_000
}

// =============================================================================
// Timeout Defaults
// =============================================================================

pub fn default_connect_timeout_ms() -> u64 {
    20_000
}
