//! Logging setup on top of flexi_logger
//!
//! Log lines go to a size-rotated file in the configured log directory and
//! are duplicated to stderr.

use flexi_logger::{
    Cleanup, Criterion, DeferredNow, Duplicate, FileSpec, Logger, LoggerHandle, Naming,
};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

/// Base name of the log file inside the log directory
pub const LOG_BASENAME: &str = "mq_listener";
/// Rotate once the active file reaches this size
pub const LOG_ROTATE_BYTES: u64 = 5 * 1024 * 1024;
/// Rotated files kept besides the active one
pub const LOG_KEEP_FILES: usize = 3;
/// Infix flexi_logger gives the file currently written with numbered rotation
pub const ACTIVE_LOG_INFIX: &str = "rCURRENT";

// Keeps the file writer alive for the lifetime of the process
static LOGGER_HANDLE: std::sync::OnceLock<std::sync::Mutex<LoggerHandle>> =
    std::sync::OnceLock::new();

/// Line layout for log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LogFormat {
    /// `timestamp [LEVEL] message`
    #[default]
    Text,
    /// Text plus `module/file.rs:line`
    Ext,
    /// One JSON object per line
    Json,
}

/// Everything needed to start the logger
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub level: String,
    pub format: LogFormat,
    /// Directory for the rotated log file; `None` logs to stderr only
    pub directory: Option<PathBuf>,
    pub color: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            directory: None,
            color: false,
        }
    }
}

/// Assemble (but do not start) the logger described by `options`
pub fn build_logger(options: &LoggingOptions) -> Result<Logger, Box<dyn std::error::Error>> {
    let mut logger = Logger::try_with_str(&options.level)?;

    logger = match options.format {
        LogFormat::Json => logger.format(json_format),
        LogFormat::Ext => {
            let logger = logger.format_for_files(extended_format);
            if options.color {
                logger.format_for_stderr(extended_color_format)
            } else {
                logger.format_for_stderr(extended_format)
            }
        }
        LogFormat::Text => {
            let logger = logger.format_for_files(text_format);
            if options.color {
                logger.format_for_stderr(text_color_format)
            } else {
                logger.format_for_stderr(text_format)
            }
        }
    };

    if let Some(directory) = &options.directory {
        logger = logger
            .log_to_file(file_spec(directory))
            .rotate(
                Criterion::Size(LOG_ROTATE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(LOG_KEEP_FILES),
            )
            .append()
            .duplicate_to_stderr(Duplicate::All);
    }

    Ok(logger)
}

/// File specification for the active log file in `directory`
pub fn file_spec(directory: &Path) -> FileSpec {
    FileSpec::default()
        .directory(directory)
        .basename(LOG_BASENAME)
        .suppress_timestamp()
}

/// Path of the file currently written in `directory`.
/// Rotated files take its place as `mq_listener_r00000.log` and onward.
pub fn active_log_path(directory: &Path) -> PathBuf {
    directory.join(format!("{}_{}.log", LOG_BASENAME, ACTIVE_LOG_INFIX))
}

/// Start the process-wide logger. The log directory must already exist.
pub fn init_logging(options: &LoggingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let handle = build_logger(options)?.start()?;
    if LOGGER_HANDLE.set(std::sync::Mutex::new(handle)).is_err() {
        return Err("Logger already initialised".into());
    }
    Ok(())
}

/// Change the active log level at runtime
pub fn set_log_level(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("Logger handle not initialised. Call init_logging first.")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "Could not acquire logger handle lock")?;
    handle.parse_and_push_temp_spec(level)?;
    Ok(())
}

/// Flush buffered log output, used right before the process exits
pub fn flush_logging() {
    if let Some(handle_mutex) = LOGGER_HANDLE.get() {
        if let Ok(handle) = handle_mutex.lock() {
            handle.flush();
        }
    }
}

fn level_name(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERROR",
        log::Level::Warn => "WARNING",
        log::Level::Info => "INFO",
        log::Level::Debug => "DEBUG",
        log::Level::Trace => "TRACE",
    }
}

// "YYYY-MM-DD HH:MM:SS,mmm [LEVEL] message"
fn text_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S,%3f"),
        level_name(record.level()),
        record.args()
    )
}

fn text_color_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    write!(
        w,
        "{} [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S,%3f").to_string().dimmed(),
        colored_level(record.level()),
        record.args()
    )
}

fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    let target_formatted = format_target_as_path(record.target(), record.line());

    write!(
        w,
        "{} [{}] {} ({})",
        now.format("%Y-%m-%d %H:%M:%S,%3f"),
        level_name(record.level()),
        record.args(),
        target_formatted
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    let target_formatted = format_target_as_path(record.target(), record.line());

    write!(
        w,
        "{} [{}] {} ({})",
        now.format("%Y-%m-%d %H:%M:%S,%3f").to_string().dimmed(),
        colored_level(record.level()),
        record.args(),
        target_formatted.dimmed()
    )
}

fn colored_level(level: log::Level) -> colored::ColoredString {
    use colored::*;

    match level {
        log::Level::Error => level_name(level).red().bold(),
        log::Level::Warn => level_name(level).yellow(),
        log::Level::Info => level_name(level).green(),
        log::Level::Debug => level_name(level).blue(),
        log::Level::Trace => level_name(level).magenta(),
    }
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use serde_json::{json, to_string};

    let json_obj = json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_name(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line()),
    });

    match to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

// mqlistener::consumer::runner -> consumer/runner.rs:42
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = if let Some(without_prefix) = target.strip_prefix("mqlistener::") {
        without_prefix.replace("::", "/") + ".rs"
    } else {
        target.replace("::", "/")
    };

    if let Some(line_num) = line {
        format!("{}:{}", path_like, line_num)
    } else {
        path_like
    }
}
