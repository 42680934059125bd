use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::{ContainerRef, ObjectEntry, ObjectMetadata, ObjectStorage};
use bridge_traits::trainer::CorpusLabels;
use core_tagging::{GeneratedTags, ObjectInfo, TagGenerator, TagGeneratorRegistry};
use mockall::mock;
use std::sync::Arc;

mock! {
    pub Storage {}

    #[async_trait]
    impl ObjectStorage for Storage {
        async fn list_containers(&self) -> Result<Vec<ContainerRef>>;
        async fn list_objects(&self, container: &str) -> Result<Vec<ObjectEntry>>;
        async fn get_object_metadata(&self, container: &str, object: &str) -> Result<ObjectMetadata>;
        async fn fetch_object_stream(
            &self,
            container: &str,
            object: &str,
        ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
    }
}

/// Storage that lists `containers` in order
pub fn storage_listing(containers: &[&str]) -> MockStorage {
    let names: Vec<String> = containers.iter().map(|s| s.to_string()).collect();
    let mut storage = MockStorage::new();
    storage
        .expect_list_containers()
        .returning(move || Ok(names.iter().map(|n| ContainerRef::new(n.as_str())).collect()));
    storage
}

/// Serve the listing of `container` as `(object, content type)` pairs, with a HEAD per object
pub fn serve_container(storage: &mut MockStorage, container: &str, objects: &[(&str, &str)]) {
    let name = container.to_string();
    let entries: Vec<String> = objects.iter().map(|(o, _)| o.to_string()).collect();
    storage
        .expect_list_objects()
        .withf(move |c| c == name)
        .returning(move |_| Ok(entries.iter().map(|o| ObjectEntry::new(o.as_str())).collect()));

    for (object, content_type) in objects {
        let (name, object, content_type) =
            (container.to_string(), object.to_string(), content_type.to_string());
        storage
            .expect_get_object_metadata()
            .withf(move |c, o| c == name && o == object)
            .returning(move |_, _| {
                Ok(ObjectMetadata::new().with_header("content-type", content_type.as_str()))
            });
    }
}

/// Listing `container` fails as if it had vanished
pub fn fail_container(storage: &mut MockStorage, container: &str) {
    let name = container.to_string();
    storage
        .expect_list_objects()
        .withf(move |c| c == name)
        .returning(|c| Err(BridgeError::NotFound(c.to_string())));
}

/// Supports the given content types and tags every object with its file name
pub struct ContentTypeGenerator {
    accepts: Vec<String>,
}

impl ContentTypeGenerator {
    pub fn new(accepts: &[&str]) -> Self {
        Self {
            accepts: accepts.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl TagGenerator for ContentTypeGenerator {
    fn name(&self) -> &str {
        "content-type"
    }

    fn is_supported(&self, object: &ObjectInfo) -> bool {
        object
            .content_type()
            .map_or(false, |ct| self.accepts.contains(&ct))
    }

    async fn generate_tags(&self, object: &ObjectInfo) -> core_tagging::Result<GeneratedTags> {
        Ok(GeneratedTags::new(vec![object.object.object_name.clone()]))
    }
}

pub fn supported_registry(content_types: &[&str]) -> TagGeneratorRegistry {
    TagGeneratorRegistry::new().with_generator(Arc::new(ContentTypeGenerator::new(content_types)))
}

pub fn labels(entries: &[(&str, &[&str])]) -> CorpusLabels {
    entries
        .iter()
        .map(|(path, tags)| {
            (
                path.to_string(),
                tags.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}
