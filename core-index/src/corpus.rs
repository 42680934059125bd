//! Training corpus assembly.
//!
//! Added objects are tagged through the registry with a bounded number of
//! objects in flight; the generators for one object run one after another.
//! Unchanged objects reuse their prior labels without touching a generator.

use crate::scan::ScanResult;
use bridge_traits::trainer::TrainingCorpus;
use core_tagging::{ObjectInfo, TagGeneratorRegistry};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Assembled corpus plus what went into it
#[derive(Debug, Default)]
pub struct CorpusReport {
    pub corpus: TrainingCorpus,
    /// Added objects that produced tags
    pub tagged: usize,
    /// Added objects dropped because a generator failed
    pub failed: usize,
    /// Unchanged objects whose prior labels were reused
    pub reused: usize,
}

pub(crate) struct CorpusBuilder<'a> {
    registry: &'a TagGeneratorRegistry,
    concurrency: usize,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(registry: &'a TagGeneratorRegistry, concurrency: usize) -> Self {
        Self {
            registry,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn build(&self, scan: &ScanResult) -> CorpusReport {
        let mut report = CorpusReport::default();

        let mut generated: Vec<(String, Option<Vec<String>>)> =
            stream::iter(scan.added_objects.clone())
                .map(|object| async move {
                    let tags = self.tag_object(&object).await;
                    (object.path().to_string(), tags)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        generated.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, tags) in generated {
            match tags {
                Some(tags) => {
                    report.tagged += 1;
                    for tag in tags {
                        report.corpus.push(tag, path.as_str());
                    }
                }
                None => report.failed += 1,
            }
        }

        for path in &scan.unchanged_paths {
            for label in scan.prior_labels_of(path) {
                report.corpus.push(label.as_str(), path.as_str());
            }
            report.reused += 1;
        }

        debug!(
            rows = report.corpus.len(),
            tagged = report.tagged,
            failed = report.failed,
            reused = report.reused,
            "Corpus assembled"
        );
        report
    }

    /// All tags for one object, or `None` if any supporting generator failed
    async fn tag_object(&self, object: &ObjectInfo) -> Option<Vec<String>> {
        let mut tags = Vec::new();
        for generator in self.registry.supporting(object) {
            match generator.generate_tags(object).await {
                Ok(generated) => tags.extend(generated.tags),
                Err(e) => {
                    warn!(
                        path = %object.path(),
                        generator = generator.name(),
                        error = %e,
                        "Tag generation failed, object left out of corpus"
                    );
                    return None;
                }
            }
        }
        Some(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::labels;
    use async_trait::async_trait;
    use bridge_traits::storage::{ObjectMetadata, ObjectRef};
    use core_tagging::{GeneratedTags, TagGenerator, TaggingError};
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        Generator {}

        #[async_trait]
        impl TagGenerator for Generator {
            fn name(&self) -> &str;
            fn is_supported(&self, object: &ObjectInfo) -> bool;
            async fn generate_tags(&self, object: &ObjectInfo) -> core_tagging::Result<GeneratedTags>;
        }
    }

    fn image(name: &str) -> ObjectInfo {
        ObjectInfo::new(
            ObjectRef::new("c1", name),
            ObjectMetadata::new().with_header("content-type", "image/jpeg"),
        )
    }

    fn scan_with(added: Vec<ObjectInfo>, unchanged: &[(&str, &[&str])]) -> ScanResult {
        ScanResult {
            added_objects: added,
            deleted_paths: Vec::new(),
            unchanged_paths: unchanged.iter().map(|(p, _)| p.to_string()).collect(),
            prior_labels: labels(unchanged),
        }
    }

    #[tokio::test]
    async fn test_unchanged_labels_reused_without_generators() {
        let mut generator = MockGenerator::new();
        generator.expect_name().return_const("mock".to_string());
        generator.expect_is_supported().return_const(true);
        generator.expect_generate_tags().times(0);
        let registry = TagGeneratorRegistry::new().with_generator(Arc::new(generator));

        let scan = scan_with(Vec::new(), &[("/c1/Image1.jpg", &["a", "b", "c"])]);
        let report = CorpusBuilder::new(&registry, 5).build(&scan).await;

        let rows: Vec<(&str, &str)> = report
            .corpus
            .rows()
            .iter()
            .map(|r| (r.text.as_str(), r.label.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("a", "/c1/Image1.jpg"),
                ("b", "/c1/Image1.jpg"),
                ("c", "/c1/Image1.jpg")
            ]
        );
        assert_eq!(report.reused, 1);
    }

    #[tokio::test]
    async fn test_generators_run_in_order_and_concatenate() {
        let mut first = MockGenerator::new();
        first.expect_name().return_const("first".to_string());
        first.expect_is_supported().return_const(true);
        first
            .expect_generate_tags()
            .times(1)
            .returning(|_| Ok(GeneratedTags::new(vec!["person".to_string()])));

        let mut second = MockGenerator::new();
        second.expect_name().return_const("second".to_string());
        second.expect_is_supported().return_const(true);
        second
            .expect_generate_tags()
            .times(1)
            .returning(|_| Ok(GeneratedTags::new(vec!["beach".to_string()])));

        let registry = TagGeneratorRegistry::new()
            .with_generator(Arc::new(first))
            .with_generator(Arc::new(second));

        let scan = scan_with(vec![image("Image3.jpg")], &[]);
        let report = CorpusBuilder::new(&registry, 5).build(&scan).await;

        let texts: Vec<&str> = report.corpus.rows().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["person", "beach"]);
        assert!(report
            .corpus
            .rows()
            .iter()
            .all(|r| r.label == "/c1/Image3.jpg"));
    }

    #[tokio::test]
    async fn test_generator_failure_drops_only_that_object() {
        let mut generator = MockGenerator::new();
        generator.expect_name().return_const("mock".to_string());
        generator.expect_is_supported().return_const(true);
        generator.expect_generate_tags().returning(|object| {
            if object.path() == "/c1/broken.jpg" {
                Err(TaggingError::Analysis("service unavailable".to_string()))
            } else {
                Ok(GeneratedTags::new(vec!["tag".to_string()]))
            }
        });
        let registry = TagGeneratorRegistry::new().with_generator(Arc::new(generator));

        let scan = scan_with(
            vec![image("broken.jpg"), image("ok-1.jpg"), image("ok-2.jpg")],
            &[],
        );
        let report = CorpusBuilder::new(&registry, 5).build(&scan).await;

        assert_eq!(report.tagged, 2);
        assert_eq!(report.failed, 1);
        let labels: Vec<&str> = report.corpus.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["/c1/ok-1.jpg", "/c1/ok-2.jpg"]);
    }
}
