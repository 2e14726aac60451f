// src/storage.rs
//! Storage port for persisted collections.
//!
//! The history store reads a whole named collection and rewrites it in full
//! on every mutation; this trait is the seam that keeps it testable without
//! touching the filesystem.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use crate::core::FsOps;

#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Read a collection's serialized payload. Absent collections are not an
    /// error and yield `None`.
    async fn read(&self, collection: &str) -> Result<Option<String>>;

    /// Replace a collection's serialized payload.
    async fn write(&self, collection: &str, payload: &str) -> Result<()>;
}

/// File-backed storage: one `<collection>.json` document per collection
/// under the configured data directory.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{}.json", collection))
    }
}

#[async_trait]
impl StoragePort for FileStorage {
    async fn read(&self, collection: &str) -> Result<Option<String>> {
        let path = self.collection_path(collection);
        if !FsOps::file_exists(&path).await {
            return Ok(None);
        }

        let content = FsOps::read_file(&path)
            .await
            .with_context(|| format!("Failed to read collection: {}", collection))?;
        Ok(Some(content))
    }

    async fn write(&self, collection: &str, payload: &str) -> Result<()> {
        let path = self.collection_path(collection);
        FsOps::write_file(&path, payload)
            .await
            .with_context(|| format!("Failed to write collection: {}", collection))?;

        info!("Persisted collection {} to {}", collection, path.display());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());

        assert!(storage.read("cv_history").await.unwrap().is_none());

        storage.write("cv_history", "[]").await.unwrap();
        assert_eq!(storage.read("cv_history").await.unwrap().as_deref(), Some("[]"));

        storage.write("cv_history", r#"[{"id":"a"}]"#).await.unwrap();
        assert_eq!(
            storage.read("cv_history").await.unwrap().as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );
    }

    #[tokio::test]
    async fn file_storage_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("deep"));

        storage.write("cv_history", "[]").await.unwrap();
        assert!(storage.read("cv_history").await.unwrap().is_some());
    }
}
