use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::errors::MemoryError;

/// Trait defining the persistence seam behind the memory store.
///
/// The store never touches the filesystem directly; everything goes
/// through a backend so tests can swap in [`InMemoryBackend`].
#[async_trait]
pub trait MemoryBackend: Send + Sync + std::fmt::Debug {
    /// Read the persisted contents, `None` when nothing has been stored
    async fn read(&self) -> Result<Option<String>, MemoryError>;

    /// Replace the persisted contents wholesale
    async fn write(&self, contents: &str) -> Result<(), MemoryError>;

    /// Remove the persisted contents if present
    async fn clear(&self) -> Result<(), MemoryError>;
}

/// Type alias for Arc-wrapped MemoryBackend trait objects
pub type MemoryBackendRef = Arc<dyn MemoryBackend>;

/// File-backed implementation writing a single JSON file
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl MemoryBackend for FileBackend {
    async fn read(&self) -> Result<Option<String>, MemoryError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, contents: &str) -> Result<(), MemoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, contents).await?;
        debug!(path = %self.path.display(), "Wrote memory file");
        Ok(())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed memory file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory implementation of MemoryBackend, used as a test double and
/// for ephemeral deployments
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    contents: RwLock<Option<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    async fn read(&self) -> Result<Option<String>, MemoryError> {
        let contents = self.contents.read().map_err(|e| {
            MemoryError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(contents.clone())
    }

    async fn write(&self, new_contents: &str) -> Result<(), MemoryError> {
        let mut contents = self.contents.write().map_err(|e| {
            MemoryError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *contents = Some(new_contents.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        let mut contents = self.contents.write().map_err(|e| {
            MemoryError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *contents = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_backend_read_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("maira_memory.json"));
        assert_eq!(backend.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_backend_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("maira_memory.json");
        let backend = FileBackend::new(&path);

        backend.write("[]").await.unwrap();
        assert!(path.exists());
        assert_eq!(backend.read().await.unwrap().as_deref(), Some("[]"));

        backend.clear().await.unwrap();
        assert!(!path.exists());
        assert_eq!(backend.read().await.unwrap(), None);

        // Clearing twice is not an error.
        backend.clear().await.unwrap();
    }

    #[tokio::test]
    async fn in_memory_backend_round_trips() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.read().await.unwrap(), None);

        backend.write("[1]").await.unwrap();
        assert_eq!(backend.read().await.unwrap().as_deref(), Some("[1]"));

        backend.clear().await.unwrap();
        assert_eq!(backend.read().await.unwrap(), None);
    }
}
