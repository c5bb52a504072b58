//! Command-line arguments
//!
//! Every configuration key can be given on the command line. Values are all
//! optional here: anything left unset is filled from the configuration file
//! and then from the built-in defaults when the arguments are resolved into a
//! [`DaemonConfig`](super::config::DaemonConfig).

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "mqlistener")]
#[command(about = "Drains a message queue into timestamped XML documents")]
#[command(version, long_version = crate::core::version::long_version())]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Broker host name or address
    #[arg(short = 'H', long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// Broker port
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<i64>,

    /// Channel (durable consumer name)
    #[arg(long = "channel", value_name = "NAME")]
    pub channel: Option<String>,

    /// Queue manager (stream name)
    #[arg(short = 'm', long = "manager", value_name = "NAME")]
    pub manager: Option<String>,

    /// Queue to drain (filter subject)
    #[arg(short = 'q', long = "queue", value_name = "NAME")]
    pub queue: Option<String>,

    /// Broker user name (requires --password)
    #[arg(short = 'u', long = "username", value_name = "USER")]
    pub username: Option<String>,

    /// Broker password (requires --username)
    #[arg(long = "password", value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Directory documents are written to
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for the rotated log file
    #[arg(long = "log-dir", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// How long each receive waits for a message
    #[arg(long = "wait-timeout-ms", value_name = "MILLIS")]
    pub wait_timeout_ms: Option<i64>,

    /// Pause after each stored message
    #[arg(long = "message-delay-ms", value_name = "MILLIS")]
    pub message_delay_ms: Option<i64>,

    /// Pause before reconnecting after a failure
    #[arg(long = "reconnect-delay-ms", value_name = "MILLIS")]
    pub reconnect_delay_ms: Option<i64>,

    /// TCP connection timeout
    #[arg(long = "connect-timeout-ms", value_name = "MILLIS")]
    pub connect_timeout_ms: Option<i64>,

    /// What an empty receive means: stop the listener or keep waiting
    #[arg(long = "idle-policy", value_name = "POLICY", value_parser = ["stop", "wait"])]
    pub idle_policy: Option<String>,

    /// Text that marks a leading transport header
    #[arg(long = "header-marker", value_name = "TEXT")]
    pub header_marker: Option<String>,

    /// Text where the payload starts after a transport header
    #[arg(long = "payload-marker", value_name = "TEXT")]
    pub payload_marker: Option<String>,

    /// Log level
    #[arg(
        short = 'l',
        long = "log-level",
        value_name = "LEVEL",
        value_parser = ["trace", "debug", "info", "warn", "warning", "error", "off"]
    )]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Force colored log output on stderr
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored log output
    #[arg(long = "no-color", conflicts_with = "color")]
    pub no_color: bool,

    /// Color setting from the configuration file, used when neither flag is given
    #[arg(skip)]
    pub config_color: Option<bool>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from an explicit argument list (first element is the program name)
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Resolve colored output: flags win, then the config file, then whether
    /// stderr is a terminal
    pub fn use_color(&self) -> bool {
        if self.no_color {
            false
        } else if self.color {
            true
        } else {
            self.config_color
                .unwrap_or_else(|| std::io::stderr().is_terminal())
        }
    }
}
