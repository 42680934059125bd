//! # Scan / Diff
//!
//! Compares the labels of the last indexed corpus with what storage holds
//! now. Every object path ends up in exactly one bucket:
//!
//! - **unchanged**: path is already in the prior corpus (no metadata fetch)
//! - **added**: new path that at least one tag generator supports
//! - **deleted**: path in the prior corpus that storage no longer lists
//!
//! New paths no generator supports, and objects whose metadata cannot be
//! read, are left out of all three. A container that cannot be listed is
//! skipped, so its prior paths count as deleted.

use crate::error::{IndexError, Result};
use bridge_traits::storage::{ObjectRef, ObjectStorage};
use bridge_traits::trainer::CorpusLabels;
use core_tagging::{ObjectInfo, TagGeneratorRegistry};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Outcome of one scan, kept by the engine until `index()` consumes it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    /// New supported objects, sorted by path
    pub added_objects: Vec<ObjectInfo>,
    /// Sorted
    pub deleted_paths: Vec<String>,
    /// Sorted
    pub unchanged_paths: Vec<String>,
    /// Labels of the prior corpus, by path
    pub prior_labels: CorpusLabels,
}

impl ScanResult {
    pub fn additions(&self) -> usize {
        self.added_objects.len()
    }

    pub fn deletions(&self) -> usize {
        self.deleted_paths.len()
    }

    pub fn unchanged(&self) -> usize {
        self.unchanged_paths.len()
    }

    pub fn total_changes(&self) -> usize {
        self.additions() + self.deletions()
    }

    pub fn has_changes(&self) -> bool {
        self.total_changes() > 0
    }

    /// Prior labels of an unchanged or deleted path
    pub fn prior_labels_of(&self, path: &str) -> &[String] {
        self.prior_labels
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Walks storage and classifies every object against the prior labels
pub(crate) struct Scanner<'a> {
    storage: &'a dyn ObjectStorage,
    registry: &'a TagGeneratorRegistry,
    concurrency: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(
        storage: &'a dyn ObjectStorage,
        registry: &'a TagGeneratorRegistry,
        concurrency: usize,
    ) -> Self {
        Self {
            storage,
            registry,
            concurrency: concurrency.max(1),
        }
    }

    /// # Errors
    ///
    /// Only a failure to list containers is returned. Failures for a single
    /// container or object are logged and skipped.
    pub async fn run(&self, prior_labels: CorpusLabels) -> Result<ScanResult> {
        let containers = self
            .storage
            .list_containers()
            .await
            .map_err(IndexError::Storage)?;

        let mut added: BTreeMap<String, ObjectInfo> = BTreeMap::new();
        let mut unchanged: BTreeSet<String> = BTreeSet::new();

        for container in &containers {
            let entries = match self.storage.list_objects(&container.name).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(container = %container.name, error = %e, "Failed to list container, skipping");
                    continue;
                }
            };

            let mut candidates = Vec::new();
            for entry in entries {
                let object = ObjectRef::new(container.name.as_str(), entry.name);
                if prior_labels.contains_key(&object.path) {
                    unchanged.insert(object.path);
                } else {
                    candidates.push(object);
                }
            }

            let inspected: Vec<Option<ObjectInfo>> = stream::iter(candidates)
                .map(|object| self.inspect(object))
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            let before = added.len();
            for info in inspected.into_iter().flatten() {
                added.insert(info.path().to_string(), info);
            }
            debug!(
                container = %container.name,
                added = added.len() - before,
                "Container scanned"
            );
        }

        let deleted_paths: Vec<String> = prior_labels
            .keys()
            .filter(|path| !unchanged.contains(*path))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let result = ScanResult {
            added_objects: added.into_values().collect(),
            deleted_paths,
            unchanged_paths: unchanged.into_iter().collect(),
            prior_labels,
        };

        info!(
            containers = containers.len(),
            additions = result.additions(),
            deletions = result.deletions(),
            unchanged = result.unchanged(),
            "Diff computed"
        );
        Ok(result)
    }

    /// Fetch metadata for a new object and keep it if any generator supports it
    async fn inspect(&self, object: ObjectRef) -> Option<ObjectInfo> {
        let metadata = match self
            .storage
            .get_object_metadata(&object.container_name, &object.object_name)
            .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %object.path, error = %e, "Failed to read object metadata, skipping");
                return None;
            }
        };

        let info = ObjectInfo::new(object, metadata);
        if self.registry.supports(&info) {
            Some(info)
        } else {
            debug!(
                path = %info.path(),
                content_type = ?info.content_type(),
                "No tag generator supports object"
            );
            None
        }
    }
}
