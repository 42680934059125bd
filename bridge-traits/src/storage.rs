//! Object Storage Abstractions
//!
//! Container/object listing, per-object metadata and byte streaming for a
//! remote object store. The indexing engine addresses every object by its
//! path, `/<container>/<object>`, which doubles as the classifier label.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;

/// A container as reported by the storage listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRef {
    pub name: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

impl ContainerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: None,
            bytes: None,
        }
    }
}

/// An object as reported by a container listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default)]
    pub bytes: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

impl ObjectEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: None,
            content_type: None,
            last_modified: None,
        }
    }
}

/// Fully qualified reference to one stored object.
///
/// `path` is always `"/" + container_name + "/" + object_name` and is the
/// identity used for diffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub container_name: String,
    pub object_name: String,
    pub path: String,
}

impl ObjectRef {
    pub fn new(container_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        let container_name = container_name.into();
        let object_name = object_name.into();
        let path = format!("/{}/{}", container_name, object_name);
        Self {
            container_name,
            object_name,
            path,
        }
    }

    /// Split a label path back into container and object.
    ///
    /// Container names cannot contain `/`, so the first separator after the
    /// leading slash ends the container; the object name keeps any further
    /// slashes (pseudo-directories).
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix('/')?;
        let (container, object) = rest.split_once('/')?;
        if container.is_empty() || object.is_empty() {
            return None;
        }
        Some(Self::new(container, object))
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Object metadata headers, keys normalized to lowercase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    headers: HashMap<String, String>,
}

impl ObjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        Self { headers }
    }

    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw `content-type` header, parameters included
    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

/// Remote object storage trait
///
/// Implemented by storage connectors (e.g. OpenStack Swift). Every call may
/// fail independently; the engine decides which failures are fatal.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::ObjectStorage;
///
/// async fn count_objects(storage: &dyn ObjectStorage) -> Result<usize> {
///     let mut total = 0;
///     for container in storage.list_containers().await? {
///         total += storage.list_objects(&container.name).await?.len();
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// List all containers visible to the configured account
    async fn list_containers(&self) -> Result<Vec<ContainerRef>>;

    /// List all objects of one container
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotFound` if the container does not exist.
    async fn list_objects(&self, container: &str) -> Result<Vec<ObjectEntry>>;

    /// Fetch the metadata headers of one object without its body
    async fn get_object_metadata(&self, container: &str, object: &str) -> Result<ObjectMetadata>;

    /// Stream the body of one object
    async fn fetch_object_stream(
        &self,
        container: &str,
        object: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
}
