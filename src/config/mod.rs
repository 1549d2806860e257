//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Config struct definitions and TOML loading
//! - [`endpoint`]: Push endpoint resolution (config value, then environment)
//! - [`validation`]: Startup checks that collect every problem at once

mod defaults;
mod endpoint;
mod types;
mod validation;

pub use endpoint::{
    API_URL_VAR, DEFAULT_ENDPOINT, WS_URL_VAR, resolve_endpoint, resolve_endpoint_from_env,
};
pub use types::{
    AuthConfig, Config, ConfigError, EndpointConfig, MetricsConfig, ReconnectConfig,
    SubscriptionsConfig, TimeoutsConfig,
};
pub use validation::{ValidationError, has_supported_scheme, validate};
