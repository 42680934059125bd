//! Tag generator capability and the static registry the engine dispatches through.

use crate::content_type::content_type_of;
use crate::error::{Result, TaggingError};
use async_trait::async_trait;
use bridge_traits::storage::{ObjectMetadata, ObjectRef, ObjectStorage};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// An object plus the metadata fetched for it during scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub object: ObjectRef,
    pub metadata: ObjectMetadata,
}

impl ObjectInfo {
    pub fn new(object: ObjectRef, metadata: ObjectMetadata) -> Self {
        Self { object, metadata }
    }

    pub fn path(&self) -> &str {
        &self.object.path
    }

    /// MIME essence of the `content-type` header
    pub fn content_type(&self) -> Option<String> {
        content_type_of(&self.metadata)
    }
}

/// Tags produced for one object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTags {
    pub tags: Vec<String>,
}

impl GeneratedTags {
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }
}

/// Produces searchable tags for the objects it supports.
///
/// `is_supported` must be cheap and side-effect free; it runs for every new
/// object during scan. `generate_tags` runs only during index.
#[async_trait]
pub trait TagGenerator: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn is_supported(&self, object: &ObjectInfo) -> bool;

    /// # Errors
    ///
    /// `TaggingError::Unsupported` when called for an object this generator
    /// does not support; any other error when the object cannot be tagged.
    async fn generate_tags(&self, object: &ObjectInfo) -> Result<GeneratedTags>;
}

/// Fixed set of generators, assembled once at startup.
#[derive(Clone, Default)]
pub struct TagGeneratorRegistry {
    generators: Vec<Arc<dyn TagGenerator>>,
}

impl TagGeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(mut self, generator: Arc<dyn TagGenerator>) -> Self {
        self.register(generator);
        self
    }

    pub fn register(&mut self, generator: Arc<dyn TagGenerator>) {
        self.generators.push(generator);
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }

    /// True if at least one generator accepts the object
    pub fn supports(&self, object: &ObjectInfo) -> bool {
        self.generators.iter().any(|g| g.is_supported(object))
    }

    /// Generators accepting the object, in registration order
    pub fn supporting(&self, object: &ObjectInfo) -> Vec<Arc<dyn TagGenerator>> {
        self.generators
            .iter()
            .filter(|g| g.is_supported(object))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for TagGeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagGeneratorRegistry")
            .field("generators", &self.names())
            .finish()
    }
}

pub(crate) fn unsupported(generator: &str, object: &ObjectInfo) -> TaggingError {
    TaggingError::Unsupported {
        generator: generator.to_string(),
        path: object.path().to_string(),
        content_type: object
            .metadata
            .content_type()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Read a whole object body from storage.
pub(crate) async fn download(storage: &dyn ObjectStorage, object: &ObjectRef) -> Result<Bytes> {
    let mut reader = storage
        .fetch_object_stream(&object.container_name, &object.object_name)
        .await?;

    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .await
        .map_err(bridge_traits::BridgeError::Io)?;
    Ok(Bytes::from(buffer))
}
