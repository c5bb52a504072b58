//! CLI module: argument parsing, configuration file loading and validation

pub mod args;
pub mod config;
pub mod validation;

pub use args::Args;
pub use config::{ConfigError, DaemonConfig};

/// Parse the process arguments, merge the configuration file and validate
/// the result
pub async fn load_daemon_config() -> Result<DaemonConfig, ConfigError> {
    let mut args = <Args as clap::Parser>::parse();
    args.merge_config_file().await?;
    Ok(args.into_daemon_config()?)
}

#[cfg(test)]
mod tests;
