//! In-memory storage, trainer and generators shared by the engine tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::{ContainerRef, ObjectEntry, ObjectMetadata, ObjectStorage};
use bridge_traits::time::Clock;
use bridge_traits::trainer::{
    ClassScore, ClassifyResponse, CorpusLabels, JobStatus, Trainer, TrainingCorpus, TrainingJob,
};
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use core_tagging::{GeneratedTags, ObjectInfo, TagGenerator, TaggingError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub fn day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 9, 30, 0).unwrap()
}

pub fn labels(entries: &[(&str, &[&str])]) -> CorpusLabels {
    entries
        .iter()
        .map(|(path, tags)| (path.to_string(), tags.iter().map(|t| t.to_string()).collect()))
        .collect()
}

/// Counts overlapping calls and remembers the highest overlap
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Hold one slot for a short while so concurrent callers overlap
    async fn hold(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Default)]
pub struct FakeStorage {
    containers: Mutex<Vec<(String, Vec<(String, String)>)>>,
    failing_containers: HashSet<String>,
    /// When set, `list_containers` signals `entered` and waits for `release`
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    metadata_in_flight: Option<Arc<InFlight>>,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, container: &str, object: &str, content_type: &str) -> Self {
        self.add_object(container, object, content_type);
        self
    }

    pub fn failing_container(mut self, container: &str) -> Self {
        self.failing_containers.insert(container.to_string());
        self
    }

    pub fn gated(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((entered, release));
        self
    }

    pub fn tracking_metadata(mut self, in_flight: Arc<InFlight>) -> Self {
        self.metadata_in_flight = Some(in_flight);
        self
    }

    pub fn add_object(&self, container: &str, object: &str, content_type: &str) {
        let mut containers = self.containers.lock().unwrap();
        let entry = (object.to_string(), content_type.to_string());
        match containers.iter_mut().find(|(name, _)| name == container) {
            Some((_, objects)) => objects.push(entry),
            None => containers.push((container.to_string(), vec![entry])),
        }
    }

    fn content_type(&self, container: &str, object: &str) -> Option<String> {
        let containers = self.containers.lock().unwrap();
        containers
            .iter()
            .filter(|(name, _)| name == container)
            .flat_map(|(_, objects)| objects.iter())
            .find(|(name, _)| name == object)
            .map(|(_, content_type)| content_type.clone())
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn list_containers(&self) -> Result<Vec<ContainerRef>> {
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .iter()
            .map(|(name, _)| ContainerRef::new(name.as_str()))
            .collect())
    }

    async fn list_objects(&self, container: &str) -> Result<Vec<ObjectEntry>> {
        if self.failing_containers.contains(container) {
            return Err(BridgeError::OperationFailed(format!("listing {} failed", container)));
        }
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .iter()
            .filter(|(name, _)| name == container)
            .flat_map(|(_, objects)| objects.iter())
            .map(|(name, _)| ObjectEntry::new(name.as_str()))
            .collect())
    }

    async fn get_object_metadata(&self, container: &str, object: &str) -> Result<ObjectMetadata> {
        if let Some(in_flight) = &self.metadata_in_flight {
            in_flight.hold().await;
        }
        self.content_type(container, object)
            .map(|ct| ObjectMetadata::new().with_header("content-type", ct))
            .ok_or_else(|| BridgeError::NotFound(format!("/{}/{}", container, object)))
    }

    async fn fetch_object_stream(
        &self,
        container: &str,
        object: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>> {
        Err(BridgeError::NotFound(format!("/{}/{}", container, object)))
    }
}

// ============================================================================
// Trainer
// ============================================================================

pub struct FakeTrainer {
    jobs: Mutex<Vec<TrainingJob>>,
    corpora: Mutex<HashMap<String, CorpusLabels>>,
    submissions: Mutex<Vec<TrainingCorpus>>,
    submitted_status: JobStatus,
    failing_list: bool,
    failing_watch: bool,
    watches: AtomicUsize,
}

impl FakeTrainer {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            corpora: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            submitted_status: JobStatus::Training,
            failing_list: false,
            failing_watch: false,
            watches: AtomicUsize::new(0),
        }
    }

    pub fn with_job(self, id: &str, status: JobStatus, created: DateTime<Utc>) -> Self {
        self.jobs.lock().unwrap().push(TrainingJob {
            id: id.to_string(),
            name: "objectstorage-classifier".to_string(),
            status,
            created,
        });
        self
    }

    pub fn with_corpus(self, job_id: &str, corpus: CorpusLabels) -> Self {
        self.corpora.lock().unwrap().insert(job_id.to_string(), corpus);
        self
    }

    /// Status reported for newly submitted jobs
    pub fn submitting_as(mut self, status: JobStatus) -> Self {
        self.submitted_status = status;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.failing_list = true;
        self
    }

    pub fn failing_watch(mut self) -> Self {
        self.failing_watch = true;
        self
    }

    pub fn submissions(&self) -> Vec<TrainingCorpus> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn watch_count(&self) -> usize {
        self.watches.load(Ordering::SeqCst)
    }

    fn set_status(&self, job_id: &str, status: JobStatus) -> Option<TrainingJob> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.iter_mut().find(|job| job.id == job_id)?;
        job.status = status;
        Some(job.clone())
    }
}

#[async_trait]
impl Trainer for FakeTrainer {
    async fn list_jobs(&self) -> Result<Vec<TrainingJob>> {
        if self.failing_list {
            return Err(BridgeError::OperationFailed("trainer unreachable".into()));
        }
        Ok(self.jobs.lock().unwrap().clone())
    }

    async fn get_corpus(&self, job_id: &str) -> Result<CorpusLabels> {
        self.corpora
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(format!("corpus for {}", job_id)))
    }

    async fn submit_job(&self, training_data: Bytes) -> Result<TrainingJob> {
        let corpus = TrainingCorpus::from_csv(&training_data)?;
        let mut jobs = self.jobs.lock().unwrap();
        let job = TrainingJob {
            id: format!("submitted-{}", jobs.len() + 1),
            name: "objectstorage-classifier".to_string(),
            status: self.submitted_status.clone(),
            created: day(28),
        };
        jobs.push(job.clone());
        self.corpora
            .lock()
            .unwrap()
            .insert(job.id.clone(), corpus.labels_by_path());
        self.submissions.lock().unwrap().push(corpus);
        Ok(job)
    }

    async fn watch_job(&self, job_id: &str) -> Result<TrainingJob> {
        self.watches.fetch_add(1, Ordering::SeqCst);
        if self.failing_watch {
            return Err(BridgeError::OperationFailed("status poll failed".into()));
        }
        self.set_status(job_id, JobStatus::Available)
            .ok_or_else(|| BridgeError::NotFound(job_id.to_string()))
    }

    async fn current_selected_job(&self) -> Result<TrainingJob> {
        let jobs = self.jobs.lock().unwrap();
        let newest = |status: JobStatus| {
            jobs.iter()
                .filter(|job| job.status == status)
                .max_by_key(|job| job.created)
                .cloned()
        };
        newest(JobStatus::Available)
            .or_else(|| newest(JobStatus::Training))
            .ok_or_else(|| BridgeError::NotFound("no classifier".into()))
    }

    /// Every path whose labels contain the text scores 0.9, others 0.1
    async fn classify(&self, text: &str) -> Result<ClassifyResponse> {
        let job = self.current_selected_job().await?;
        let corpora = self.corpora.lock().unwrap();
        let corpus = corpora.get(&job.id).cloned().unwrap_or_default();

        let mut classes: Vec<ClassScore> = corpus
            .iter()
            .map(|(path, tags)| ClassScore {
                label: path.clone(),
                confidence: if tags.iter().any(|t| t == text) { 0.9 } else { 0.1 },
            })
            .collect();
        classes.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap()
                .then_with(|| a.label.cmp(&b.label))
        });

        Ok(ClassifyResponse {
            job_id: job.id,
            text: text.to_string(),
            top_class: classes.first().map(|c| c.label.clone()).unwrap_or_default(),
            classes,
        })
    }
}

// ============================================================================
// Tag generators
// ============================================================================

/// Supports a fixed set of content types and tags objects with their file name
pub struct CountingGenerator {
    accepts: Vec<&'static str>,
    calls: AtomicUsize,
    failing_paths: HashSet<String>,
    in_flight: Option<Arc<InFlight>>,
}

impl CountingGenerator {
    pub fn new(accepts: &[&'static str]) -> Self {
        Self {
            accepts: accepts.to_vec(),
            calls: AtomicUsize::new(0),
            failing_paths: HashSet::new(),
            in_flight: None,
        }
    }

    pub fn tracking(mut self, in_flight: Arc<InFlight>) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    pub fn failing_for(mut self, path: &str) -> Self {
        self.failing_paths.insert(path.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TagGenerator for CountingGenerator {
    fn name(&self) -> &str {
        "counting"
    }

    fn is_supported(&self, object: &ObjectInfo) -> bool {
        object
            .content_type()
            .map_or(false, |ct| self.accepts.contains(&ct.as_str()))
    }

    async fn generate_tags(&self, object: &ObjectInfo) -> core_tagging::Result<GeneratedTags> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(in_flight) = &self.in_flight {
            in_flight.hold().await;
        }
        if self.failing_paths.contains(object.path()) {
            return Err(TaggingError::Analysis(format!("cannot analyze {}", object.path())));
        }
        Ok(GeneratedTags::new(vec![
            object.object.object_name.clone(),
            object.object.container_name.clone(),
        ]))
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
