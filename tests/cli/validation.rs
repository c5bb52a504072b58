//! CLI validation tests

use mqlistener::app::cli::args::Args;
use mqlistener::core::error_handling::{fatal_message, ContextualError};
use mqlistener::app::cli::config::ConfigError;

#[test]
fn test_missing_queue_is_user_actionable() {
    let args = Args::parse_from_args(["mqlistener", "--channel", "A", "--manager", "M"]).unwrap();

    let err = ConfigError::from(args.into_daemon_config().unwrap_err());

    assert!(err.is_user_actionable());
    assert_eq!(
        fatal_message(&err, "Invalid configuration"),
        "Error: 'queue' is required (set it with --queue or in the configuration file)"
    );
}

#[test]
fn test_credentials_from_command_line() {
    let args = Args::parse_from_args([
        "mqlistener",
        "--channel",
        "A",
        "--manager",
        "M",
        "--queue",
        "q",
        "--username",
        "app",
        "--password",
        "secret",
        "--no-color",
    ])
    .unwrap();

    let config = args.into_daemon_config().unwrap();
    let credentials = config.endpoint.credentials.unwrap();
    assert_eq!(credentials.username, "app");
    assert!(!format!("{:?}", credentials).contains("secret"));
}
