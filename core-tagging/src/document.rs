//! Document tagging: text extraction followed by keyword extraction.
//!
//! Plain text is decoded directly. Rich formats (HTML, PDF, Word) need a
//! [`DocumentConverter`]; without one the generator only claims `text/plain`.
//! Unlike image tagging, any failure here fails the whole object.

use crate::content_type::{content_type_of, is_one_of};
use crate::error::{Result, TaggingError};
use crate::generator::{download, unsupported, GeneratedTags, ObjectInfo, TagGenerator};
use async_trait::async_trait;
use bridge_traits::storage::ObjectStorage;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const PLAIN_TEXT: &str = "text/plain";

/// Formats that require conversion to text first
pub const CONVERTIBLE_CONTENT_TYPES: &[&str] = &[
    "text/html",
    "text/xhtml+xml",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Converts a rich document to normalized plain text
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert_to_text(&self, document: Bytes, content_type: &str) -> Result<String>;
}

/// Extracts the most relevant keywords of a text
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>>;
}

pub struct DocumentTagGenerator {
    storage: Arc<dyn ObjectStorage>,
    keywords: Arc<dyn KeywordExtractor>,
    converter: Option<Arc<dyn DocumentConverter>>,
}

impl DocumentTagGenerator {
    pub fn new(storage: Arc<dyn ObjectStorage>, keywords: Arc<dyn KeywordExtractor>) -> Self {
        Self {
            storage,
            keywords,
            converter: None,
        }
    }

    pub fn with_converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    async fn extract_text(&self, object: &ObjectInfo, content_type: &str) -> Result<String> {
        let document = download(self.storage.as_ref(), &object.object).await?;

        if content_type == PLAIN_TEXT {
            return String::from_utf8(document.to_vec())
                .map_err(|e| TaggingError::InvalidDocument(format!("{}: {}", object.path(), e)));
        }

        match &self.converter {
            Some(converter) => converter.convert_to_text(document, content_type).await,
            None => Err(unsupported(self.name(), object)),
        }
    }
}

#[async_trait]
impl TagGenerator for DocumentTagGenerator {
    fn name(&self) -> &str {
        "document"
    }

    fn is_supported(&self, object: &ObjectInfo) -> bool {
        is_one_of(&object.metadata, &[PLAIN_TEXT])
            || (self.converter.is_some() && is_one_of(&object.metadata, CONVERTIBLE_CONTENT_TYPES))
    }

    #[instrument(skip(self, object), fields(path = %object.path()))]
    async fn generate_tags(&self, object: &ObjectInfo) -> Result<GeneratedTags> {
        if !self.is_supported(object) {
            return Err(unsupported(self.name(), object));
        }
        let content_type = content_type_of(&object.metadata).unwrap_or_default();

        let text = self.extract_text(object, &content_type).await?;
        let tags = self.keywords.extract_keywords(&text).await?;

        debug!(tag_count = tags.len(), content_type, "Generated document tags");
        Ok(GeneratedTags::new(tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::FrequencyKeywordExtractor;
    use crate::test_support::MemoryStorage;
    use bridge_traits::storage::{ObjectMetadata, ObjectRef};
    use mockall::mock;

    mock! {
        Converter {}

        #[async_trait]
        impl DocumentConverter for Converter {
            async fn convert_to_text(&self, document: Bytes, content_type: &str) -> Result<String>;
        }
    }

    fn doc(name: &str, content_type: &str) -> ObjectInfo {
        ObjectInfo::new(
            ObjectRef::new("container2", name),
            ObjectMetadata::new().with_header("content-type", content_type),
        )
    }

    fn storage() -> Arc<MemoryStorage> {
        Arc::new(
            MemoryStorage::new()
                .with_object(
                    "container2",
                    "Doc 1",
                    b"Kubernetes clusters schedule containers. Kubernetes scales clusters.",
                )
                .with_object("container2", "report.pdf", b"%PDF-1.4")
                .with_object("container2", "binary.txt", &[0xff, 0xfe, 0x00]),
        )
    }

    #[test]
    fn test_rich_formats_need_converter() {
        let plain_only = DocumentTagGenerator::new(storage(), Arc::new(FrequencyKeywordExtractor::default()));
        assert!(plain_only.is_supported(&doc("Doc 1", "text/plain; charset=utf-8")));
        assert!(!plain_only.is_supported(&doc("report.pdf", "application/pdf")));

        let with_converter = DocumentTagGenerator::new(storage(), Arc::new(FrequencyKeywordExtractor::default()))
            .with_converter(Arc::new(MockConverter::new()));
        assert!(with_converter.is_supported(&doc("report.pdf", "application/pdf")));
        assert!(!with_converter.is_supported(&doc("Image1.jpg", "image/jpeg")));
    }

    #[tokio::test]
    async fn test_plain_text_skips_converter() {
        let mut converter = MockConverter::new();
        converter.expect_convert_to_text().times(0);

        let generator = DocumentTagGenerator::new(storage(), Arc::new(FrequencyKeywordExtractor::new(2)))
            .with_converter(Arc::new(converter));
        let tags = generator
            .generate_tags(&doc("Doc 1", "text/plain"))
            .await
            .unwrap();

        assert_eq!(tags.tags, vec!["kubernetes", "clusters"]);
    }

    #[tokio::test]
    async fn test_pdf_goes_through_converter() {
        let mut converter = MockConverter::new();
        converter
            .expect_convert_to_text()
            .times(1)
            .returning(|document, content_type| {
                assert_eq!(&document[..], b"%PDF-1.4");
                assert_eq!(content_type, "application/pdf");
                Ok("quarterly revenue revenue".to_string())
            });

        let generator = DocumentTagGenerator::new(storage(), Arc::new(FrequencyKeywordExtractor::new(1)))
            .with_converter(Arc::new(converter));
        let tags = generator
            .generate_tags(&doc("report.pdf", "application/pdf"))
            .await
            .unwrap();

        assert_eq!(tags.tags, vec!["revenue"]);
    }

    #[tokio::test]
    async fn test_converter_failure_fails_object() {
        let mut converter = MockConverter::new();
        converter
            .expect_convert_to_text()
            .returning(|_, _| Err(TaggingError::Analysis("conversion refused".into())));

        let generator = DocumentTagGenerator::new(storage(), Arc::new(FrequencyKeywordExtractor::default()))
            .with_converter(Arc::new(converter));

        assert!(matches!(
            generator.generate_tags(&doc("report.pdf", "application/pdf")).await,
            Err(TaggingError::Analysis(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_utf8_plain_text() {
        let generator = DocumentTagGenerator::new(storage(), Arc::new(FrequencyKeywordExtractor::default()));

        assert!(matches!(
            generator.generate_tags(&doc("binary.txt", "text/plain")).await,
            Err(TaggingError::InvalidDocument(_))
        ));
    }
}
