//! Image tagging through a visual recognition service.
//!
//! Tags are the union, in order, of: recognized classes, face attributes
//! (gender and identity name), and words read from the image. Each of the
//! three analyses may fail on its own; a failure is logged and the other
//! analyses still contribute.

use crate::content_type::is_one_of;
use crate::error::Result;
use crate::generator::{download, unsupported, GeneratedTags, ObjectInfo, TagGenerator};
use async_trait::async_trait;
use bridge_traits::storage::ObjectStorage;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, error, instrument};

pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// A face found in an image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedFace {
    pub gender: Option<String>,
    pub identity: Option<String>,
}

/// Visual recognition back-end
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Class names recognized in the image
    async fn classify(&self, image: Bytes) -> Result<Vec<String>>;

    async fn detect_faces(&self, image: Bytes) -> Result<Vec<DetectedFace>>;

    /// Words read from the image
    async fn recognize_text(&self, image: Bytes) -> Result<Vec<String>>;
}

pub struct ImageTagGenerator {
    storage: Arc<dyn ObjectStorage>,
    analyzer: Arc<dyn ImageAnalyzer>,
}

impl ImageTagGenerator {
    pub fn new(storage: Arc<dyn ObjectStorage>, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        Self { storage, analyzer }
    }
}

fn push_non_empty(tags: &mut Vec<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        tags.push(value);
    }
}

#[async_trait]
impl TagGenerator for ImageTagGenerator {
    fn name(&self) -> &str {
        "image"
    }

    fn is_supported(&self, object: &ObjectInfo) -> bool {
        is_one_of(&object.metadata, IMAGE_CONTENT_TYPES)
    }

    #[instrument(skip(self, object), fields(path = %object.path()))]
    async fn generate_tags(&self, object: &ObjectInfo) -> Result<GeneratedTags> {
        if !self.is_supported(object) {
            return Err(unsupported(self.name(), object));
        }

        let image = download(self.storage.as_ref(), &object.object).await?;
        let mut tags = Vec::new();

        match self.analyzer.classify(image.clone()).await {
            Ok(classes) => tags.extend(classes.into_iter().filter(|c| !c.trim().is_empty())),
            Err(e) => error!(error = %e, "Image classification failed"),
        }

        match self.analyzer.detect_faces(image.clone()).await {
            Ok(faces) => {
                for face in faces {
                    push_non_empty(&mut tags, face.gender);
                    push_non_empty(&mut tags, face.identity);
                }
            }
            Err(e) => error!(error = %e, "Face detection failed"),
        }

        match self.analyzer.recognize_text(image).await {
            Ok(words) => tags.extend(words.into_iter().filter(|w| !w.trim().is_empty())),
            Err(e) => error!(error = %e, "Text recognition failed"),
        }

        debug!(tag_count = tags.len(), "Generated image tags");
        Ok(GeneratedTags::new(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaggingError;
    use crate::test_support::MemoryStorage;
    use bridge_traits::storage::{ObjectMetadata, ObjectRef};
    use mockall::mock;

    mock! {
        Analyzer {}

        #[async_trait]
        impl ImageAnalyzer for Analyzer {
            async fn classify(&self, image: Bytes) -> Result<Vec<String>>;
            async fn detect_faces(&self, image: Bytes) -> Result<Vec<DetectedFace>>;
            async fn recognize_text(&self, image: Bytes) -> Result<Vec<String>>;
        }
    }

    fn jpeg(name: &str) -> ObjectInfo {
        ObjectInfo::new(
            ObjectRef::new("container1", name),
            ObjectMetadata::new().with_header("content-type", "image/jpeg"),
        )
    }

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new().with_object("container1", "Image1.jpg", b"jpeg-bytes"))
    }

    #[test]
    fn test_supported_types() {
        let generator = ImageTagGenerator::new(storage(), Arc::new(MockAnalyzer::new()));

        assert!(generator.is_supported(&jpeg("Image1.jpg")));
        let png = ObjectInfo::new(
            ObjectRef::new("c", "a.png"),
            ObjectMetadata::new().with_header("content-type", "IMAGE/PNG; foo=bar"),
        );
        assert!(generator.is_supported(&png));
        let gif = ObjectInfo::new(
            ObjectRef::new("c", "a.gif"),
            ObjectMetadata::new().with_header("content-type", "image/gif"),
        );
        assert!(!generator.is_supported(&gif));
    }

    #[tokio::test]
    async fn test_combines_all_analyses() {
        let mut analyzer = MockAnalyzer::new();
        analyzer
            .expect_classify()
            .times(1)
            .returning(|image| {
                assert_eq!(&image[..], b"jpeg-bytes");
                Ok(vec!["person".to_string(), "beach".to_string()])
            });
        analyzer.expect_detect_faces().times(1).returning(|_| {
            Ok(vec![DetectedFace {
                gender: Some("MALE".to_string()),
                identity: Some("Barack Obama".to_string()),
            }])
        });
        analyzer
            .expect_recognize_text()
            .times(1)
            .returning(|_| Ok(vec!["hello".to_string(), "".to_string()]));

        let generator = ImageTagGenerator::new(storage(), Arc::new(analyzer));
        let tags = generator.generate_tags(&jpeg("Image1.jpg")).await.unwrap();

        assert_eq!(
            tags.tags,
            vec!["person", "beach", "MALE", "Barack Obama", "hello"]
        );
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_partial_tags() {
        let mut analyzer = MockAnalyzer::new();
        analyzer
            .expect_classify()
            .returning(|_| Ok(vec!["tree".to_string()]));
        analyzer
            .expect_detect_faces()
            .returning(|_| Err(TaggingError::Analysis("face service unavailable".into())));
        analyzer
            .expect_recognize_text()
            .returning(|_| Err(TaggingError::Analysis("text service unavailable".into())));

        let generator = ImageTagGenerator::new(storage(), Arc::new(analyzer));
        let tags = generator.generate_tags(&jpeg("Image1.jpg")).await.unwrap();

        assert_eq!(tags.tags, vec!["tree"]);
    }

    #[tokio::test]
    async fn test_download_failure_is_an_error() {
        let generator = ImageTagGenerator::new(storage(), Arc::new(MockAnalyzer::new()));
        let result = generator.generate_tags(&jpeg("missing.jpg")).await;

        assert!(matches!(result, Err(TaggingError::Storage(_))));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_object() {
        let generator = ImageTagGenerator::new(storage(), Arc::new(MockAnalyzer::new()));
        let doc = ObjectInfo::new(
            ObjectRef::new("container2", "Doc 1"),
            ObjectMetadata::new().with_header("content-type", "text/plain"),
        );

        assert!(matches!(
            generator.generate_tags(&doc).await,
            Err(TaggingError::Unsupported { .. })
        ));
    }
}
