//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - dataservice.toml (default configuration)
//! - dataservice.local.toml (git-ignored local overrides)
//! - Environment variables (DATASERVICE_* prefix)
//!
//! Addressing, proxies and credentials come from the connection address, not
//! from here. This file only tunes how the client talks HTTP and logs.
//!
//! ## Example
//!
//! ```toml
//! # dataservice.toml
//! [http]
//! connect_timeout_ms = 5000
//! request_timeout_ms = 120000
//! max_redirects = 3
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! DATASERVICE_HTTP__MAX_REDIRECTS=10
//! DATASERVICE_LOGGING__LEVEL=trace
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub http: HttpClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// TCP connect timeout in milliseconds. 0 = no timeout.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds, including streaming the body.
    /// 0 = no timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum redirect hops followed for a single request
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Append logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<String>,
}

// Default value functions
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_request_timeout_ms() -> u64 {
    60_000
}
fn default_max_redirects() -> usize {
    5
}
fn default_user_agent() -> String {
    format!("pdi-dataservice-client/{}", env!("CARGO_PKG_VERSION"))
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl ClientConfig {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. dataservice.toml (base configuration)
    /// 2. dataservice.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (DATASERVICE_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("dataservice.toml"))
            .merge(Toml::file("dataservice.local.toml"))
            .merge(Env::prefixed("DATASERVICE_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("DATASERVICE_").split("__"))
            .extract()
    }
}

impl HttpClientConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        HttpClientConfig {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_http_config() {
        let config = ClientConfig::default();
        assert_eq!(config.http.connect_timeout_ms, 10_000);
        assert_eq!(config.http.request_timeout_ms, 60_000);
        assert_eq!(config.http.max_redirects, 5);
        assert!(config.http.user_agent.starts_with("pdi-dataservice-client/"));
    }

    #[test]
    fn test_default_logging_config() {
        let config = ClientConfig::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "text");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let http = HttpClientConfig {
            connect_timeout_ms: 0,
            request_timeout_ms: 0,
            ..HttpClientConfig::default()
        };
        assert!(http.connect_timeout().is_none());
        assert!(http.request_timeout().is_none());

        let http = HttpClientConfig::default();
        assert_eq!(http.request_timeout(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = ClientConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[http]"));
        assert!(toml_str.contains("[logging]"));

        let back: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.http.max_redirects, 5);
        assert_eq!(back.logging.level, "warn");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let back: ClientConfig = toml::from_str("[http]\nmax_redirects = 2\n").unwrap();
        assert_eq!(back.http.max_redirects, 2);
        assert_eq!(back.http.connect_timeout_ms, 10_000);
        assert_eq!(back.logging.format, "text");
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = ClientConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.http.request_timeout_ms, 60_000);
    }
}
