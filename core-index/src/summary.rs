//! Structured results returned to callers.
//!
//! Expected limitations (busy engine, nothing to index, classifier not ready)
//! are `Ok` summaries with a `false` flag and a [`LimitReason`]. Callers
//! branch on the flag; `Err` is reserved for failures.

use crate::scan::ScanResult;
use bridge_traits::trainer::{ClassifyResponse, CorpusLabels, TrainingJob};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Why an operation did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitReason {
    ScanInProgress,
    BlockedByIndex,
    BlockedByScan,
    IndexInProgress,
    MustScanFirst,
    NoChanges,
    AlreadyTraining,
    NoTrainingData,
    StillTraining,
    IndexNotStarted,
}

impl LimitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitReason::ScanInProgress => "scan-in-progress",
            LimitReason::BlockedByIndex => "blocked-by-index",
            LimitReason::BlockedByScan => "blocked-by-scan",
            LimitReason::IndexInProgress => "index-in-progress",
            LimitReason::MustScanFirst => "must-scan-first",
            LimitReason::NoChanges => "no-changes",
            LimitReason::AlreadyTraining => "already-training",
            LimitReason::NoTrainingData => "no-training-data",
            LimitReason::StillTraining => "still-training",
            LimitReason::IndexNotStarted => "index-not-started",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            LimitReason::ScanInProgress => "A scan is already in progress.",
            LimitReason::BlockedByIndex => "Cannot scan while indexing is in progress.",
            LimitReason::BlockedByScan => "Cannot index while a scan is in progress.",
            LimitReason::IndexInProgress => "Indexing is already in progress.",
            LimitReason::MustScanFirst => "Run a scan before indexing.",
            LimitReason::NoChanges => "The last scan found no changes to index.",
            LimitReason::AlreadyTraining => "The classifier is already training.",
            LimitReason::NoTrainingData => "No tags could be generated for the changed objects.",
            LimitReason::StillTraining => "The classifier is still training.",
            LimitReason::IndexNotStarted => "Nothing has been indexed yet.",
        }
    }
}

impl fmt::Display for LimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Scan
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub completed: bool,
    pub reason: Option<LimitReason>,
    pub description: String,
    pub additions: usize,
    pub deletions: usize,
    pub total_changes: usize,
    pub unchanged: usize,
}

impl ScanSummary {
    pub(crate) fn limited(reason: LimitReason) -> Self {
        Self {
            completed: false,
            reason: Some(reason),
            description: reason.description().to_string(),
            additions: 0,
            deletions: 0,
            total_changes: 0,
            unchanged: 0,
        }
    }

    pub(crate) fn from_result(result: &ScanResult) -> Self {
        let description = if result.has_changes() {
            format!(
                "Scan complete: {} added, {} deleted, {} unchanged.",
                result.additions(),
                result.deletions(),
                result.unchanged()
            )
        } else {
            format!("Scan complete: no changes ({} unchanged).", result.unchanged())
        };

        Self {
            completed: true,
            reason: None,
            description,
            additions: result.additions(),
            deletions: result.deletions(),
            total_changes: result.total_changes(),
            unchanged: result.unchanged(),
        }
    }
}

// ============================================================================
// Index
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub started: bool,
    pub reason: Option<LimitReason>,
    pub description: String,
    /// Id of the submitted training job
    pub job_id: Option<String>,
    /// Rows in the submitted corpus
    pub corpus_rows: usize,
}

impl IndexSummary {
    pub(crate) fn limited(reason: LimitReason) -> Self {
        Self {
            started: false,
            reason: Some(reason),
            description: reason.description().to_string(),
            job_id: None,
            corpus_rows: 0,
        }
    }

    pub(crate) fn started(job: &TrainingJob, corpus_rows: usize) -> Self {
        Self {
            started: true,
            reason: None,
            description: format!(
                "Training started for job {} with {} corpus rows.",
                job.id, corpus_rows
            ),
            job_id: Some(job.id.clone()),
            corpus_rows,
        }
    }
}

// ============================================================================
// Classify
// ============================================================================

/// One candidate object for a classified text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMatch {
    /// Object path
    pub label: String,
    pub confidence: f64,
    /// Tags the object was trained with, when requested
    pub training_data: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResult {
    pub job_id: String,
    pub top_class: String,
    pub classes: Vec<ClassMatch>,
}

impl ClassifyResult {
    pub(crate) fn new(response: ClassifyResponse, training_data: Option<&CorpusLabels>) -> Self {
        let classes = response
            .classes
            .into_iter()
            .map(|class| ClassMatch {
                training_data: training_data.and_then(|labels| {
                    let tags = labels.get(&class.label).cloned();
                    if tags.is_none() {
                        warn!(label = %class.label, "Class has no training data in the corpus");
                    }
                    tags
                }),
                label: class.label,
                confidence: class.confidence,
            })
            .collect();

        Self {
            job_id: response.job_id,
            top_class: response.top_class,
            classes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifySummary {
    pub successful: bool,
    pub reason: Option<LimitReason>,
    pub description: String,
    pub result: Option<ClassifyResult>,
}

impl ClassifySummary {
    pub(crate) fn limited(reason: LimitReason) -> Self {
        Self {
            successful: false,
            reason: Some(reason),
            description: reason.description().to_string(),
            result: None,
        }
    }

    pub(crate) fn classified(result: ClassifyResult) -> Self {
        Self {
            successful: true,
            reason: None,
            description: format!(
                "{} candidate objects, best match {}.",
                result.classes.len(),
                result.top_class
            ),
            result: Some(result),
        }
    }
}
