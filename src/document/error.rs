//! Document Error Types

use crate::core::error_handling::ContextualError;
use std::path::PathBuf;

/// Failure to store a document
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write document {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move document into place at {path}: {source}")]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistError {
    /// Path the failed operation was targeting
    pub fn path(&self) -> &PathBuf {
        match self {
            PersistError::CreateDirectory { path, .. }
            | PersistError::Write { path, .. }
            | PersistError::Rename { path, .. } => path,
        }
    }
}

impl ContextualError for PersistError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Failure to read a stored document back
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentParseError {
    #[error("Malformed document: {message}")]
    Malformed { message: String },

    #[error("Document is missing element <{element}>")]
    MissingElement { element: &'static str },
}
