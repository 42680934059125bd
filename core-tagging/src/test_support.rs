use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::{ContainerRef, ObjectEntry, ObjectMetadata, ObjectStorage};
use std::collections::HashMap;
use std::io::Cursor;

/// Object bodies keyed by `(container, object)`
#[derive(Default)]
pub struct MemoryStorage {
    bodies: HashMap<(String, String), Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, container: &str, object: &str, body: &[u8]) -> Self {
        self.bodies
            .insert((container.to_string(), object.to_string()), body.to_vec());
        self
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>> {
        Ok(Vec::new())
    }

    async fn list_objects(&self, _container: &str) -> Result<Vec<ObjectEntry>> {
        Ok(Vec::new())
    }

    async fn get_object_metadata(&self, _container: &str, _object: &str) -> Result<ObjectMetadata> {
        Ok(ObjectMetadata::new())
    }

    async fn fetch_object_stream(
        &self,
        container: &str,
        object: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        let body = self
            .bodies
            .get(&(container.to_string(), object.to_string()))
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(format!("/{}/{}", container, object)))?;
        Ok(Box::new(Cursor::new(body)))
    }
}
