//! Validation utilities for configuration values
//!
//! Every check here produces a `ValidationError` whose message is shown to
//! the operator verbatim, so messages name the offending key.

use crate::core::error_handling::ContextualError;
use std::fmt;
use std::time::Duration;

/// A configuration value the operator has to fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Require a value to be present and not blank
pub fn require_non_empty(key: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::new(&format!(
            "'{}' is required and cannot be empty",
            key
        ))),
    }
}

/// Validate a TCP port number; zero is rejected
pub fn validate_port(key: &str, value: i64) -> Result<u16, ValidationError> {
    match u16::try_from(value) {
        Ok(0) | Err(_) => Err(ValidationError::new(&format!(
            "'{}' must be between 1 and 65535, got {}",
            key, value
        ))),
        Ok(port) => Ok(port),
    }
}

/// Validate a millisecond interval, which must be strictly positive
pub fn validate_millis(key: &str, value: i64) -> Result<Duration, ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(&format!(
            "'{}' must be a positive number of milliseconds, got {}",
            key, value
        )));
    }
    Ok(Duration::from_millis(value as u64))
}

/// Validate a broker object name (stream, consumer or subject).
///
/// Whitespace and control characters are never valid in these names.
pub fn validate_broker_name(key: &str, value: &str) -> Result<String, ValidationError> {
    let value = require_non_empty(key, Some(value))?;
    if let Some(bad) = value.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::new(&format!(
            "'{}' contains an invalid character {:?}: '{}'",
            key, bad, value
        )));
    }
    Ok(value)
}

/// Validate that a marker string is usable for matching
pub fn validate_marker(key: &str, value: &str) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(&format!("'{}' cannot be empty", key)));
    }
    Ok(value.to_string())
}
