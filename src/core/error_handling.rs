//! Fatal error reporting
//!
//! Only startup failures are fatal for the daemon; everything the consumer
//! loop encounters is logged and retried. This module decides how much of a
//! fatal error is shown to the operator.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True when the error carries a message the operator can act on directly
    /// (bad configuration value, missing file).
    fn is_user_actionable(&self) -> bool;

    /// The operator-facing message for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with a level of detail that depends on whether the
/// operator can fix it.
///
/// User-actionable errors log their own message; system errors log
/// `operation_context` and leave the details to debug level.
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

/// Render a fatal error for stderr, used before logging is available
pub fn fatal_message<E: ContextualError>(error: &E, operation_context: &str) -> String {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => format!("Error: {}", user_msg),
        _ => format!("Error: {}: {}", operation_context, error),
    }
}
