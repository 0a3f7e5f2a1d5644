//! # Controller Configuration
//!
//! Configuration loaded from environment variables.
//!
//! All settings have defaults and can be overridden via environment variables,
//! typically populated from a ConfigMap using `envFrom` in the deployment.

mod controller;
mod server;

pub use controller::ControllerConfig;
pub use server::ServerConfig;

/// Load configuration from environment variables with defaults
pub fn load_config() -> (ControllerConfig, ServerConfig) {
    (ControllerConfig::from_env(), ServerConfig::from_env())
}

/// Read environment variable or return default value
///
/// Unset or unparsable values fall back to the default.
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
