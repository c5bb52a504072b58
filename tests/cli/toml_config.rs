//! CLI TOML configuration tests
//!
//! Tests for configuration files read from disk and command-line overrides.

use mqlistener::app::cli::args::Args;
use mqlistener::app::cli::config::ConfigError;
use mqlistener::consumer::IdlePolicy;
use std::time::Duration;

fn write_config(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("mqlistener.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_config_file_supplies_required_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
channel = "LISTENER"
manager = "ORDERS"
queue = "orders.in"
idle-policy = "wait"
wait-timeout-ms = 1500
"#,
    );
    let mut args = Args::parse_from_args([
        "mqlistener",
        "--config-file",
        path.to_str().unwrap(),
        "--no-color",
    ])
    .unwrap();

    assert_eq!(args.merge_config_file().await.unwrap(), Some(path));
    let config = args.into_daemon_config().unwrap();

    assert_eq!(config.endpoint.manager, "ORDERS");
    assert_eq!(config.endpoint.url(), "nats://localhost:4222");
    assert_eq!(config.consumer.idle_policy, IdlePolicy::Wait);
    assert_eq!(config.consumer.wait_timeout, Duration::from_millis(1500));
}

#[tokio::test]
async fn test_command_line_overrides_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "channel = \"A\"\nmanager = \"M\"\nqueue = \"q\"\nhost = \"file-host\"\nport = 5000\n",
    );
    let mut args = Args::parse_from_args([
        "mqlistener",
        "-c",
        path.to_str().unwrap(),
        "--host",
        "cli-host",
        "--no-color",
    ])
    .unwrap();

    args.merge_config_file().await.unwrap();
    let config = args.into_daemon_config().unwrap();

    assert_eq!(config.endpoint.host, "cli-host");
    assert_eq!(config.endpoint.port, 5000);
}

#[tokio::test]
async fn test_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let mut args =
        Args::parse_from_args(["mqlistener", "--config-file", missing.to_str().unwrap()])
            .unwrap();

    let err = args.merge_config_file().await.unwrap_err();
    assert!(matches!(err, ConfigError::MissingFile { .. }));
    assert!(err.to_string().contains("nope.toml"));
}

#[tokio::test]
async fn test_invalid_value_in_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "message-delay-ms = \"soon\"\n");
    let mut args =
        Args::parse_from_args(["mqlistener", "--config-file", path.to_str().unwrap()]).unwrap();

    let err = args.merge_config_file().await.unwrap_err();
    assert!(matches!(err, ConfigError::InvalidFile { .. }));
}
