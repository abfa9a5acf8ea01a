//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Upstream bodies larger than this are rejected with 413 (6 MiB).
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Root configuration for the rewriting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound fetch settings.
    pub upstream: UpstreamConfig,

    /// HTML link rewriting settings.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream fetch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total request timeout in seconds. Zero disables it.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds. Zero disables it.
    pub connect_timeout_secs: u64,

    /// Maximum number of redirects followed before giving up.
    pub max_redirects: usize,

    /// Largest upstream body accepted, checked after full buffering.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 5,
            max_redirects: 10,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// Link rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Path the proxy is served on; rewritten links point here.
    pub proxy_path: String,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            proxy_path: "/proxy".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstream.max_body_bytes, 6_291_456);
        assert_eq!(config.rewrite.proxy_path, "/proxy");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [upstream]
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.upstream.max_redirects, 10);
        assert_eq!(config.upstream.max_body_bytes, MAX_BODY_BYTES);
    }
}
