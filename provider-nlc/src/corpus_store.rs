//! In-process corpus store

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::trainer::CorpusStore;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Keeps submitted corpora in memory. Contents are lost on restart, after
/// which every object scans as new.
#[derive(Debug, Default)]
pub struct InMemoryCorpusStore {
    corpora: RwLock<HashMap<String, Bytes>>,
}

impl InMemoryCorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.corpora
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CorpusStore for InMemoryCorpusStore {
    async fn save(&self, job_id: &str, training_data: Bytes) -> Result<()> {
        self.corpora
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id.to_string(), training_data);
        Ok(())
    }

    async fn load(&self, job_id: &str) -> Result<Option<Bytes>> {
        Ok(self
            .corpora
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned())
    }
}
