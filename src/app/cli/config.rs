//! TOML configuration file loading
//!
//! The file is optional. `--config-file` names one explicitly (it must then
//! exist); otherwise `<config dir>/MqListener/mqlistener.toml` is read when
//! present. Keys are the long option names in kebab-case. File values only
//! fill arguments that were not given on the command line.

use crate::consumer::ConsumerSettings;
use crate::core::error_handling::ContextualError;
use crate::core::logging::LoggingOptions;
use crate::core::validation::ValidationError;
use crate::queue::EndpointConfig;
use std::path::{Path, PathBuf};

use super::args::Args;

/// Application directory below the platform config directory
pub const CONFIG_DIR_NAME: &str = "MqListener";
pub const CONFIG_FILE_NAME: &str = "mqlistener.toml";

/// Everything the daemon needs, fully resolved and validated
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub endpoint: EndpointConfig,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub consumer: ConsumerSettings,
    pub header_marker: String,
    pub payload_marker: String,
    pub logging: LoggingOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Error reading configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Error in configuration file {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ConfigError::InvalidFile { .. } | ConfigError::Invalid(_)
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::InvalidFile { source, .. } | ConfigError::Invalid(source) => {
                source.user_message()
            }
            _ => None,
        }
    }
}

/// Default configuration file location, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Args {
    /// Find the configuration file to load, if any
    pub fn config_path(&self) -> Result<Option<PathBuf>, ConfigError> {
        match &self.config_file {
            Some(path) if path.exists() => Ok(Some(path.clone())),
            Some(path) => Err(ConfigError::MissingFile { path: path.clone() }),
            None => Ok(default_config_path().filter(|p| p.exists())),
        }
    }

    /// Load the configuration file (if any) and fill unset arguments from it.
    ///
    /// Returns the path that was loaded.
    pub async fn merge_config_file(&mut self) -> Result<Option<PathBuf>, ConfigError> {
        let Some(path) = self.config_path()? else {
            return Ok(None);
        };
        let contents =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
        self.merge_config_str(&path, &contents)?;
        Ok(Some(path))
    }

    /// Parse `contents` (read from `path`) and fill unset arguments from it
    pub fn merge_config_str(&mut self, path: &Path, contents: &str) -> Result<(), ConfigError> {
        let config =
            toml::from_str::<toml::Table>(contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        self.apply_toml_values(&config)
            .map_err(|source| ConfigError::InvalidFile {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Apply TOML configuration values to arguments that are still unset
    pub fn apply_toml_values(&mut self, config: &toml::Table) -> Result<(), ValidationError> {
        Self::apply_string(config, "host", &mut self.host)?;
        Self::apply_integer(config, "port", &mut self.port)?;
        Self::apply_string(config, "channel", &mut self.channel)?;
        Self::apply_string(config, "manager", &mut self.manager)?;
        Self::apply_string(config, "queue", &mut self.queue)?;
        Self::apply_string(config, "username", &mut self.username)?;
        Self::apply_string(config, "password", &mut self.password)?;
        Self::apply_path(config, "output-dir", &mut self.output_dir)?;
        Self::apply_path(config, "log-dir", &mut self.log_dir)?;
        Self::apply_integer(config, "wait-timeout-ms", &mut self.wait_timeout_ms)?;
        Self::apply_integer(config, "message-delay-ms", &mut self.message_delay_ms)?;
        Self::apply_integer(config, "reconnect-delay-ms", &mut self.reconnect_delay_ms)?;
        Self::apply_integer(config, "connect-timeout-ms", &mut self.connect_timeout_ms)?;
        Self::apply_string(config, "idle-policy", &mut self.idle_policy)?;
        Self::apply_string(config, "header-marker", &mut self.header_marker)?;
        Self::apply_string(config, "payload-marker", &mut self.payload_marker)?;
        Self::apply_string(config, "log-level", &mut self.log_level)?;
        Self::apply_string(config, "log-format", &mut self.log_format)?;

        if let Some(value) = config.get("color") {
            let color = value.as_bool().ok_or_else(|| type_error("color", "a boolean"))?;
            self.config_color = Some(color);
        }
        Ok(())
    }

    fn apply_string(
        config: &toml::Table,
        key: &str,
        target: &mut Option<String>,
    ) -> Result<(), ValidationError> {
        if let Some(value) = config.get(key) {
            let value = value.as_str().ok_or_else(|| type_error(key, "a string"))?;
            if target.is_none() {
                *target = Some(value.to_string());
            }
        }
        Ok(())
    }

    fn apply_path(
        config: &toml::Table,
        key: &str,
        target: &mut Option<PathBuf>,
    ) -> Result<(), ValidationError> {
        let mut value = None;
        Self::apply_string(config, key, &mut value)?;
        if target.is_none() {
            *target = value.map(PathBuf::from);
        }
        Ok(())
    }

    fn apply_integer(
        config: &toml::Table,
        key: &str,
        target: &mut Option<i64>,
    ) -> Result<(), ValidationError> {
        if let Some(value) = config.get(key) {
            let value = value
                .as_integer()
                .ok_or_else(|| type_error(key, "an integer"))?;
            if target.is_none() {
                *target = Some(value);
            }
        }
        Ok(())
    }
}

fn type_error(key: &str, expected: &str) -> ValidationError {
    ValidationError::new(&format!("'{}' must be {}", key, expected))
}
