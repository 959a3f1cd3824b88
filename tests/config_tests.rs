//! Config loading, TOML parsing, and env var override tests.
//!
//! `test_load_from_working_directory` is `#[ignore]` (it chdirs and conflicts
//! in parallel). Run it with:
//! `cargo test --test config_tests -- --ignored --test-threads=1`

use dataservice_client::{ClientConfig, Credentials, Driver, LocalServiceRegistry};
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

// Default Configuration Tests
#[test]
fn test_config_default_timeouts() {
    let config = ClientConfig::default();
    assert_eq!(config.http.connect_timeout(), Some(Duration::from_secs(10)));
    assert_eq!(config.http.request_timeout(), Some(Duration::from_secs(60)));
}

#[test]
fn test_config_default_redirects() {
    assert_eq!(ClientConfig::default().http.max_redirects, 5);
}

#[test]
fn test_config_default_user_agent() {
    let config = ClientConfig::default();
    assert_eq!(
        config.http.user_agent,
        format!("pdi-dataservice-client/{}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_config_default_logging() {
    let config = ClientConfig::default();
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, "text");
}

// TOML File Parsing Tests
#[test]
fn test_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.toml");
    fs::write(
        &path,
        r#"
[http]
connect_timeout_ms = 500
request_timeout_ms = 0
max_redirects = 2

[logging]
level = "debug"
format = "json"
file = "/tmp/dataservice-client.log"
"#,
    )
    .unwrap();

    let config = ClientConfig::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.http.connect_timeout(), Some(Duration::from_millis(500)));
    assert!(config.http.request_timeout().is_none());
    assert_eq!(config.http.max_redirects, 2);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
    assert_eq!(
        config.logging.file.as_deref(),
        Some("/tmp/dataservice-client.log")
    );
}

#[test]
fn test_from_file_partial_sections_keep_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.toml");
    fs::write(&path, "[logging]\nlevel = \"info\"\n").unwrap();

    let config = ClientConfig::from_file(path.to_str().unwrap()).unwrap();
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.http.max_redirects, 5);
    assert_eq!(config.http.connect_timeout_ms, 10_000);
}

#[test]
fn test_from_missing_file_uses_defaults() {
    let config = ClientConfig::from_file("/nonexistent/dataservice.toml").unwrap();
    assert_eq!(config.http.request_timeout_ms, 60_000);
}

#[test]
fn test_from_file_rejects_bad_types() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.toml");
    fs::write(&path, "[http]\nmax_redirects = \"many\"\n").unwrap();
    assert!(ClientConfig::from_file(path.to_str().unwrap()).is_err());
}

// Environment Variable Override Tests
#[test]
fn test_env_overrides_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("client.toml");
    fs::write(&path, "[http]\nuser_agent = \"from-file\"\n").unwrap();

    env::set_var("DATASERVICE_HTTP__USER_AGENT", "from-env");
    let config = ClientConfig::from_file(path.to_str().unwrap());
    env::remove_var("DATASERVICE_HTTP__USER_AGENT");

    assert_eq!(config.unwrap().http.user_agent, "from-env");
}

#[test]
#[ignore = "Requires --test-threads=1 due to directory change"]
fn test_load_from_working_directory() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("dataservice.toml"),
        "[http]\nmax_redirects = 1\nconnect_timeout_ms = 1000\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("dataservice.local.toml"),
        "[http]\nmax_redirects = 3\n",
    )
    .unwrap();

    let original_dir = env::current_dir().unwrap();
    env::set_current_dir(temp.path()).unwrap();
    let config = ClientConfig::load();
    env::set_current_dir(original_dir).unwrap();

    let config = config.unwrap();
    assert_eq!(config.http.max_redirects, 3);
    assert_eq!(config.http.connect_timeout_ms, 1000);
}

#[test]
fn test_driver_uses_configured_redirect_limit() {
    let mut config = ClientConfig::default();
    config.http.max_redirects = 0;
    let driver = Driver::new(config, LocalServiceRegistry::new());
    assert_eq!(driver.config().http.max_redirects, 0);

    // Building the HTTP backend from config does not touch the network
    let connection = driver
        .open("jdbc:pdi://localhost:9080/kettle", Credentials::anonymous())
        .unwrap();
    assert_eq!(connection.descriptor().host(), "localhost");
}
