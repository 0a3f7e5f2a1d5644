//! # Server Configuration
//!
//! HTTP server settings loaded from environment variables.

use super::env_var_or_default;

/// HTTP server configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the HTTP facade binds to (API, probes, metrics)
    pub bind_address: String,
    /// Server startup timeout (seconds)
    /// How long to wait for server to be ready before giving up
    pub startup_timeout_secs: u64,
    /// Server readiness poll interval (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            bind_address: DEFAULT_API_BIND_ADDRESS.to_string(),
            startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            bind_address: env_var_or_default(
                "API_BIND_ADDRESS",
                DEFAULT_API_BIND_ADDRESS.to_string(),
            ),
            startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
        }
    }

    /// Bind address with Go-style `:8090` expanded to all interfaces
    pub fn socket_address(&self) -> String {
        if self.bind_address.starts_with(':') {
            format!("0.0.0.0{}", self.bind_address)
        } else {
            self.bind_address.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:8090");
        assert_eq!(config.startup_timeout_secs, 10);
        assert_eq!(config.poll_interval_ms, 50);
    }

    #[test]
    fn test_socket_address_expands_port_only_form() {
        let config = ServerConfig {
            bind_address: ":9000".to_string(),
            ..Default::default()
        };
        assert_eq!(config.socket_address(), "0.0.0.0:9000");

        let config = ServerConfig {
            bind_address: "127.0.0.1:9000".to_string(),
            ..Default::default()
        };
        assert_eq!(config.socket_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_env_var_or_default_falls_back_on_garbage() {
        std::env::set_var("ALERTRULE_TEST_UNPARSABLE_SECS", "soon");
        assert_eq!(env_var_or_default("ALERTRULE_TEST_UNPARSABLE_SECS", 7u64), 7);
        std::env::set_var("ALERTRULE_TEST_PARSABLE_SECS", "12");
        assert_eq!(env_var_or_default("ALERTRULE_TEST_PARSABLE_SECS", 7u64), 12);
        assert_eq!(env_var_or_default("ALERTRULE_TEST_UNSET_SECS", 7u64), 7);
    }
}
