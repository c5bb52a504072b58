//! Builds documents from cleaned messages and hands them to the sink

use super::error::PersistError;
use super::model::{format_timestamp, PersistedDocument};
use super::sink::DocumentSink;
use crate::core::time::Clock;
use crate::sanitize::CleanedMessage;
use std::path::PathBuf;
use std::sync::Arc;

/// Message type tag written for every document
pub const TEXT_MESSAGE_TYPE: &str = "Text";

/// Metadata stored next to the message body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMetadata {
    pub queue_name: String,
    pub message_type: String,
}

impl MessageMetadata {
    /// Metadata for a text message taken from `queue_name`
    pub fn text(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            message_type: TEXT_MESSAGE_TYPE.to_string(),
        }
    }
}

/// Turns cleaned messages into stored documents
#[derive(Clone)]
pub struct DocumentWriter {
    sink: Arc<dyn DocumentSink>,
    clock: Arc<dyn Clock>,
}

impl DocumentWriter {
    pub fn new(sink: Arc<dyn DocumentSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    /// Prepare the sink. Called once before the consumer starts.
    pub async fn prepare(&self) -> Result<(), PersistError> {
        self.sink.ensure_directory().await
    }

    /// Build the document for `cleaned` without storing it
    pub fn build(&self, cleaned: &CleanedMessage, metadata: &MessageMetadata) -> PersistedDocument {
        PersistedDocument {
            timestamp: format_timestamp(&self.clock.now_utc()),
            queue_name: metadata.queue_name.clone(),
            message_type: metadata.message_type.clone(),
            content: cleaned.as_str().to_string(),
        }
    }

    /// Build and store the document for `cleaned`
    pub async fn persist(
        &self,
        cleaned: &CleanedMessage,
        metadata: &MessageMetadata,
    ) -> Result<PathBuf, PersistError> {
        let document = self.build(cleaned, metadata);
        let receipt = self
            .sink
            .write_document(&document.file_name(), document.to_xml().as_bytes())
            .await?;

        if receipt.replaced {
            log::warn!(
                "Overwrote {} (another message was saved within the same second)",
                receipt.path.display()
            );
        }
        log::info!("Saved clean message to {}", receipt.path.display());
        Ok(receipt.path)
    }
}
