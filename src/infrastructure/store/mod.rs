//! Completion audit stores

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::ports::{CompletionStore, StoreError, StoredCompletion};

/// Appends one JSON object per line to a file.
///
/// Writes are serialized through a mutex so lines from concurrent tests
/// never interleave.
#[derive(Debug)]
pub struct JsonlCompletionStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlCompletionStore {
    /// Open `path` for appending, creating it and its parent directory.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// File being appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CompletionStore for JsonlCompletionStore {
    async fn store(&self, record: StoredCompletion) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}
