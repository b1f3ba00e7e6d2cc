//! State manager implementation
//!
//! Provides file-based checkpoint persistence with atomic writes.

use super::types::Checkpoint;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Loads and saves the resume checkpoint
#[derive(Debug)]
pub struct StateManager {
    /// Path to the checkpoint file
    path: PathBuf,
    /// Last saved checkpoint (cached)
    checkpoint: Arc<RwLock<Option<Checkpoint>>>,
}

impl StateManager {
    /// Create a state manager for a file without reading it
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            checkpoint: Arc::new(RwLock::new(None)),
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::new(PathBuf::new())
    }

    /// Create a state manager from a file, loading the checkpoint if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let checkpoint = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| Error::State {
                message: format!("Failed to read state file: {e}"),
            })?;
            Some(parse(&contents)?)
        } else {
            None
        };

        Ok(Self {
            path,
            checkpoint: Arc::new(RwLock::new(checkpoint)),
        })
    }

    /// Record progress and write it out
    pub async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let contents = serde_json::to_string_pretty(&checkpoint).map_err(|e| Error::State {
            message: format!("Failed to serialize state: {e}"),
        })?;

        *self.checkpoint.write().await = Some(checkpoint);

        if self.is_in_memory() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::State {
                    message: format!("Failed to create state directory: {e}"),
                })?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to write state file: {e}"),
            })?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::State {
                message: format!("Failed to rename state file: {e}"),
            })?;

        Ok(())
    }

    /// Forget the checkpoint and remove the file
    pub async fn clear(&self) -> Result<()> {
        *self.checkpoint.write().await = None;

        if self.is_in_memory() {
            return Ok(());
        }

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::State {
                message: format!("Failed to remove state file: {e}"),
            }),
        }
    }

    /// The current checkpoint, if any
    pub async fn checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoint.read().await.clone()
    }

    /// Resume cursor from the current checkpoint.
    ///
    /// `None` when there is no checkpoint or it holds an empty cursor.
    pub async fn resume_cursor(&self) -> Option<String> {
        self.checkpoint
            .read()
            .await
            .as_ref()
            .filter(|c| c.is_resumable())
            .map(|c| c.cursor.clone())
    }

    /// Sibling file the checkpoint is written to before the rename
    pub(crate) fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            checkpoint: Arc::clone(&self.checkpoint),
        }
    }
}

fn parse(contents: &str) -> Result<Checkpoint> {
    serde_json::from_str(contents).map_err(|e| Error::State {
        message: format!("Failed to parse state file: {e}"),
    })
}
