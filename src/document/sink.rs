//! Document storage targets

use super::error::PersistError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Where a document ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub path: PathBuf,
    /// An existing document with the same name was overwritten
    pub replaced: bool,
}

/// Storage for serialized documents
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Create the storage location if needed. Idempotent; called once at startup.
    async fn ensure_directory(&self) -> Result<(), PersistError>;

    /// Store `contents` under `file_name`, replacing any previous document of
    /// the same name.
    async fn write_document(
        &self,
        file_name: &str,
        contents: &[u8],
    ) -> Result<WriteReceipt, PersistError>;
}

/// Filesystem sink writing each document atomically into one directory
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    directory: PathBuf,
}

impl FsDocumentSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl DocumentSink for FsDocumentSink {
    async fn ensure_directory(&self) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| PersistError::CreateDirectory {
                path: self.directory.clone(),
                source,
            })
    }

    async fn write_document(
        &self,
        file_name: &str,
        contents: &[u8],
    ) -> Result<WriteReceipt, PersistError> {
        let target = self.directory.join(file_name);
        // Same directory as the target so the rename never crosses filesystems
        let staging = self.directory.join(format!(".{}.tmp", file_name));

        let replaced = tokio::fs::try_exists(&target).await.unwrap_or(false);

        if let Err(source) = tokio::fs::write(&staging, contents).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(PersistError::Write {
                path: target,
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(PersistError::Rename {
                path: target,
                source,
            });
        }

        Ok(WriteReceipt {
            path: target,
            replaced,
        })
    }
}
