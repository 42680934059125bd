//! Corpus Store Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    trainer::CorpusStore,
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Keeps one CSV file per training job under a directory.
pub struct FileCorpusStore {
    root: PathBuf,
}

impl FileCorpusStore {
    /// Store under the platform data directory (`<data>/os-search/corpora`)
    pub fn new() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("os-search")
            .join("corpora");

        Self { root }
    }

    pub fn with_directory(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn directory(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, job_id: &str) -> Result<PathBuf> {
        let valid = !job_id.is_empty()
            && job_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BridgeError::OperationFailed(format!(
                "Invalid job id for corpus store: {:?}",
                job_id
            )));
        }
        Ok(self.root.join(format!("{}.csv", job_id)))
    }
}

impl Default for FileCorpusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CorpusStore for FileCorpusStore {
    async fn save(&self, job_id: &str, training_data: Bytes) -> Result<()> {
        let path = self.file_for(job_id)?;
        fs::create_dir_all(&self.root).await?;

        // Stage then rename into place.
        let staging = path.with_extension("csv.tmp");
        fs::write(&staging, &training_data).await?;
        fs::rename(&staging, &path).await?;

        debug!(job_id, path = ?path, bytes = training_data.len(), "Stored training corpus");
        Ok(())
    }

    async fn load(&self, job_id: &str) -> Result<Option<Bytes>> {
        let path = self.file_for(job_id)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BridgeError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        env::temp_dir().join(format!("os-search-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = FileCorpusStore::with_directory(scratch_dir("save-load"));
        let data = Bytes::from("tag 1,/c1/Image1.jpg\n");

        store.save("job-1", data.clone()).await.unwrap();
        assert_eq!(store.load("job-1").await.unwrap(), Some(data));

        let _ = fs::remove_dir_all(store.directory()).await;
    }

    #[tokio::test]
    async fn test_load_missing_job() {
        let store = FileCorpusStore::with_directory(scratch_dir("missing"));
        assert_eq!(store.load("never-trained").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_job_ids() {
        let store = FileCorpusStore::with_directory(scratch_dir("reject"));
        assert!(store.save("../escape", Bytes::new()).await.is_err());
        assert!(store.load("").await.is_err());
    }
}
