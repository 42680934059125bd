//! Trainer Abstractions
//!
//! A trainer accepts a labeled corpus, trains a text classifier from it
//! asynchronously, and later classifies free text against the trained model.
//! Training jobs are the trainer's unit of work; the most recent usable job
//! also serves as the record of what was last indexed.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{BridgeError, Result};

/// Labels previously trained for each object path
pub type CorpusLabels = HashMap<String, Vec<String>>;

// ============================================================================
// Training Jobs
// ============================================================================

/// Lifecycle status reported by the trainer for a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "Non Existent")]
    NonExistent,
    Training,
    Failed,
    Available,
    Unavailable,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::NonExistent => "Non Existent",
            JobStatus::Training => "Training",
            JobStatus::Failed => "Failed",
            JobStatus::Available => "Available",
            JobStatus::Unavailable => "Unavailable",
            JobStatus::Unknown => "Unknown",
        }
    }

    /// Jobs that count as "what was last indexed": still training or ready.
    pub fn is_usable(&self) -> bool {
        matches!(self, JobStatus::Training | JobStatus::Available)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One training job as reported by the trainer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub created: DateTime<Utc>,
}

// ============================================================================
// Classification
// ============================================================================

/// Confidence of one class for a classified text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    pub confidence: f64,
}

/// Classifier response for one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub job_id: String,
    pub text: String,
    pub top_class: String,
    pub classes: Vec<ClassScore>,
}

// ============================================================================
// Training Corpus
// ============================================================================

/// One `(text, label)` training record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRow {
    pub text: String,
    pub label: String,
}

/// Flat labeled corpus in the trainer's two-column record format.
///
/// For object search the text is a tag and the label is the object path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingCorpus {
    rows: Vec<CorpusRow>,
}

impl TrainingCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, label: impl Into<String>) {
        self.rows.push(CorpusRow {
            text: text.into(),
            label: label.into(),
        });
    }

    pub fn rows(&self) -> &[CorpusRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize as header-less CSV, one `text,label` record per row
    pub fn to_csv(&self) -> Result<Bytes> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        for row in &self.rows {
            writer
                .write_record([row.text.as_str(), row.label.as_str()])
                .map_err(|e| BridgeError::OperationFailed(format!("CSV write failed: {}", e)))?;
        }

        let data = writer
            .into_inner()
            .map_err(|e| BridgeError::OperationFailed(format!("CSV flush failed: {}", e)))?;
        Ok(Bytes::from(data))
    }

    /// Parse header-less CSV. A record may carry several labels after the text.
    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut corpus = Self::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| BridgeError::OperationFailed(format!("CSV read failed: {}", e)))?;
            let mut fields = record.iter();
            let Some(text) = fields.next() else {
                continue;
            };
            for label in fields.filter(|label| !label.is_empty()) {
                corpus.push(text, label);
            }
        }
        Ok(corpus)
    }

    /// Group texts by label, preserving record order
    pub fn labels_by_path(&self) -> CorpusLabels {
        let mut labels: CorpusLabels = HashMap::new();
        for row in &self.rows {
            labels
                .entry(row.label.clone())
                .or_default()
                .push(row.text.clone());
        }
        labels
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Text classifier trainer
///
/// # Example
///
/// ```ignore
/// use bridge_traits::trainer::{Trainer, JobStatus};
///
/// async fn is_busy(trainer: &dyn Trainer) -> Result<bool> {
///     let jobs = trainer.list_jobs().await?;
///     Ok(jobs.iter().any(|job| job.status == JobStatus::Training))
/// }
/// ```
#[async_trait]
pub trait Trainer: Send + Sync {
    /// List the jobs owned by this deployment, with status and creation time
    async fn list_jobs(&self) -> Result<Vec<TrainingJob>>;

    /// Labels the given job was trained on, keyed by object path
    async fn get_corpus(&self, job_id: &str) -> Result<CorpusLabels>;

    /// Start a new training job from CSV training data
    async fn submit_job(&self, training_data: Bytes) -> Result<TrainingJob>;

    /// Resolve once the job has left `Training`, returning its final state
    async fn watch_job(&self, job_id: &str) -> Result<TrainingJob>;

    /// The job currently used for live classification
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotFound` when nothing has been trained yet.
    async fn current_selected_job(&self) -> Result<TrainingJob>;

    /// Classify free text against the current job
    async fn classify(&self, text: &str) -> Result<ClassifyResponse>;
}

/// Durable store for submitted training data.
///
/// Trainers do not hand back the corpus a job was trained on, so connectors
/// keep a copy keyed by job id.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    async fn save(&self, job_id: &str, training_data: Bytes) -> Result<()>;

    /// `Ok(None)` when nothing was stored for the job
    async fn load(&self, job_id: &str) -> Result<Option<Bytes>>;
}
