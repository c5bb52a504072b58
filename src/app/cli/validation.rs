//! Argument validation and resolution
//!
//! Turns merged arguments (command line over configuration file) into a
//! validated [`DaemonConfig`], applying defaults for everything left unset.

use crate::consumer::{ConsumerSettings, IdlePolicy, DEFAULT_RECEIVE_GRACE};
use crate::core::logging::{LogFormat, LoggingOptions};
use crate::core::retry::BackoffPolicy;
use crate::core::validation::{
    require_non_empty, validate_broker_name, validate_marker, validate_millis, validate_port,
    ValidationError,
};
use crate::queue::{Credentials, EndpointConfig};
use crate::sanitize::{DEFAULT_HEADER_MARKER, DEFAULT_PAYLOAD_MARKER};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::args::Args;
use super::config::DaemonConfig;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: i64 = 4222;
pub const DEFAULT_OUTPUT_DIR: &str = "extracted_data";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_INTERVAL_MS: i64 = 10_000;

impl Args {
    /// Validate every value and build the daemon configuration
    pub fn into_daemon_config(self) -> Result<DaemonConfig, ValidationError> {
        let endpoint = self.endpoint_config()?;
        let consumer = self.consumer_settings()?;
        let logging = self.logging_options()?;

        let header_marker = validate_marker(
            "header-marker",
            self.header_marker.as_deref().unwrap_or(DEFAULT_HEADER_MARKER),
        )?;
        let payload_marker = validate_marker(
            "payload-marker",
            self.payload_marker
                .as_deref()
                .unwrap_or(DEFAULT_PAYLOAD_MARKER),
        )?;

        Ok(DaemonConfig {
            endpoint,
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            log_dir: logging
                .directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            consumer,
            header_marker,
            payload_marker,
            logging,
        })
    }

    fn endpoint_config(&self) -> Result<EndpointConfig, ValidationError> {
        let host = require_non_empty("host", Some(self.host.as_deref().unwrap_or(DEFAULT_HOST)))?;
        let port = validate_port("port", self.port.unwrap_or(DEFAULT_PORT))?;
        let channel = validate_broker_name("channel", Self::required("channel", &self.channel)?)?;
        let manager = validate_broker_name("manager", Self::required("manager", &self.manager)?)?;
        let queue = validate_broker_name("queue", Self::required("queue", &self.queue)?)?;

        let credentials = match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: require_non_empty("username", Some(username.as_str()))?,
                password: password.clone(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ValidationError::new(
                    "'username' is set but 'password' is missing; give both or neither",
                ))
            }
            (None, Some(_)) => {
                return Err(ValidationError::new(
                    "'password' is set but 'username' is missing; give both or neither",
                ))
            }
        };

        Ok(EndpointConfig {
            host,
            port,
            channel,
            manager,
            queue,
            credentials,
            connect_timeout: Self::millis("connect-timeout-ms", self.connect_timeout_ms)?,
        })
    }

    fn consumer_settings(&self) -> Result<ConsumerSettings, ValidationError> {
        let idle_policy = match self.idle_policy.as_deref() {
            None => IdlePolicy::default(),
            Some(name) => IdlePolicy::from_str(name).map_err(|_| {
                ValidationError::new(&format!(
                    "'idle-policy' must be 'stop' or 'wait', got '{}'",
                    name
                ))
            })?,
        };

        Ok(ConsumerSettings {
            wait_timeout: Self::millis("wait-timeout-ms", self.wait_timeout_ms)?,
            message_delay: Self::millis("message-delay-ms", self.message_delay_ms)?,
            backoff: BackoffPolicy::fixed(Self::millis(
                "reconnect-delay-ms",
                self.reconnect_delay_ms,
            )?),
            idle_policy,
            receive_grace: DEFAULT_RECEIVE_GRACE,
        })
    }

    fn logging_options(&self) -> Result<LoggingOptions, ValidationError> {
        let level = match self.log_level.as_deref().map(str::to_ascii_lowercase) {
            None => "info".to_string(),
            Some(level) if level == "warning" => "warn".to_string(),
            Some(level)
                if ["trace", "debug", "info", "warn", "error", "off"].contains(&level.as_str()) =>
            {
                level
            }
            Some(level) => {
                return Err(ValidationError::new(&format!(
                    "'log-level' must be one of trace, debug, info, warn, error, off; got '{}'",
                    level
                )))
            }
        };

        let format = match self.log_format.as_deref() {
            None => LogFormat::default(),
            Some(name) => LogFormat::from_str(name).map_err(|_| {
                ValidationError::new(&format!(
                    "'log-format' must be one of text, ext, json; got '{}'",
                    name
                ))
            })?,
        };

        Ok(LoggingOptions {
            level,
            format,
            directory: Some(
                self.log_dir
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            ),
            color: self.use_color(),
        })
    }

    fn required<'a>(
        key: &str,
        value: &'a Option<String>,
    ) -> Result<&'a str, ValidationError> {
        match value.as_deref() {
            Some(v) => Ok(v),
            None => Err(ValidationError::new(&format!(
                "'{}' is required (set it with --{} or in the configuration file)",
                key, key
            ))),
        }
    }

    fn millis(key: &str, value: Option<i64>) -> Result<Duration, ValidationError> {
        validate_millis(key, value.unwrap_or(DEFAULT_INTERVAL_MS))
    }
}
