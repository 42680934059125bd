//! # Search Engine
//!
//! Orchestrates scan, index, classification and status for one storage
//! account and one trainer.
//!
//! ## Workflow
//!
//! ### Scan
//! 1. Enter `Scanning` (or return a busy limitation)
//! 2. List trainer jobs and load the labels of the most recent usable job
//! 3. Walk storage and diff it against those labels
//! 4. Keep the [`ScanResult`] for the next `index()`
//!
//! ### Index
//! 1. Enter `Indexing` if a scan with changes is pending
//! 2. Refuse if the trainer is already training a job
//! 3. Tag added objects, reuse labels of unchanged objects
//! 4. Submit the corpus, drop the consumed scan, watch the job in the background
//!
//! ## Usage
//!
//! ```rust,ignore
//! let engine = SearchEngine::new(storage, trainer, registry, IndexingSettings::default());
//!
//! let scan = engine.scan().await?;
//! if scan.total_changes > 0 {
//!     let summary = engine
//!         .index(Some(Box::new(|outcome| println!("training finished: {:?}", outcome))))
//!         .await?;
//!     println!("{}", summary.description);
//! }
//! ```

use crate::corpus::CorpusBuilder;
use crate::error::{IndexError, Result};
use crate::scan::{ScanResult, Scanner};
use crate::selection::{most_recent_usable, training_in_progress};
use crate::state::{lock_state, EngineState, EngineStatus, RunGuard, RunState, SharedState};
use crate::summary::{ClassifyResult, ClassifySummary, IndexSummary, LimitReason, ScanSummary};
use bridge_traits::error::BridgeError;
use bridge_traits::storage::ObjectStorage;
use bridge_traits::time::{Clock, SystemClock};
use bridge_traits::trainer::{CorpusLabels, JobStatus, Trainer, TrainingJob};
use core_runtime::config::IndexingSettings;
use core_runtime::events::{CoreEvent, EventBus, ScanEvent, TrainingEvent};
use core_tagging::TagGeneratorRegistry;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, instrument, warn};

/// Receives the final state of a submitted training job, exactly once.
///
/// Only called when `index()` actually started training; otherwise it is
/// dropped unused.
pub type CompletionCallback = Box<dyn FnOnce(Result<TrainingJob>) + Send + 'static>;

pub struct SearchEngine {
    storage: Arc<dyn ObjectStorage>,
    trainer: Arc<dyn Trainer>,
    registry: TagGeneratorRegistry,
    settings: IndexingSettings,
    state: SharedState,
    event_bus: Option<EventBus>,
    clock: Arc<dyn Clock>,
}

impl SearchEngine {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        trainer: Arc<dyn Trainer>,
        registry: TagGeneratorRegistry,
        settings: IndexingSettings,
    ) -> Self {
        Self {
            storage,
            trainer,
            registry,
            settings,
            state: Arc::new(Mutex::new(EngineState::new())),
            event_bus: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn run_state(&self) -> RunState {
        lock_state(&self.state).run_state
    }

    /// The pending scan, if one finished and has not been indexed yet
    pub fn pending_scan(&self) -> Option<Arc<ScanResult>> {
        lock_state(&self.state).scan_result.clone()
    }

    pub fn registry(&self) -> &TagGeneratorRegistry {
        &self.registry
    }

    // ========================================================================
    // Scan
    // ========================================================================

    /// Diff storage against the last indexed corpus.
    ///
    /// # Errors
    ///
    /// Fails when the trainer's job list or the storage container list cannot
    /// be read. Busy states are reported through [`ScanSummary::reason`].
    #[instrument(skip(self))]
    pub async fn scan(&self) -> Result<ScanSummary> {
        let _guard = {
            let mut state = lock_state(&self.state);
            match state.run_state {
                RunState::Idle => {}
                RunState::Scanning => {
                    info!("Scan requested while a scan is running");
                    return Ok(ScanSummary::limited(LimitReason::ScanInProgress));
                }
                RunState::Indexing => {
                    info!("Scan requested while indexing");
                    return Ok(ScanSummary::limited(LimitReason::BlockedByIndex));
                }
            }
            state.status.scan_started_at = Some(self.clock.now());
            state.scan_result = None;
            RunGuard::enter(&self.state, &mut state, RunState::Scanning)
        };

        self.emit(CoreEvent::Scan(ScanEvent::Started));

        match self.run_scan().await {
            Ok(result) => {
                let summary = ScanSummary::from_result(&result);
                lock_state(&self.state).scan_result = Some(Arc::new(result));
                self.emit(CoreEvent::Scan(ScanEvent::Completed {
                    additions: summary.additions,
                    deletions: summary.deletions,
                    unchanged: summary.unchanged,
                }));
                info!(
                    additions = summary.additions,
                    deletions = summary.deletions,
                    unchanged = summary.unchanged,
                    "Scan complete"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(operation = "scan", error = %e, "Scan failed");
                self.emit(CoreEvent::Scan(ScanEvent::Failed {
                    message: e.to_string(),
                }));
                Err(e)
            }
        }
    }

    async fn run_scan(&self) -> Result<ScanResult> {
        info!("Phase 1: Loading labels of the last indexed corpus");
        let jobs = self.trainer.list_jobs().await.map_err(IndexError::Trainer)?;
        let prior_labels = match most_recent_usable(&jobs) {
            Some(job) => match self.trainer.get_corpus(&job.id).await {
                Ok(labels) => {
                    debug!(job_id = %job.id, paths = labels.len(), "Loaded prior corpus");
                    labels
                }
                Err(e) => {
                    warn!(job_id = %job.id, error = %e, "Prior corpus unavailable, treating every object as new");
                    CorpusLabels::new()
                }
            },
            None => {
                debug!("No trained job yet");
                CorpusLabels::new()
            }
        };

        info!(known_paths = prior_labels.len(), "Phase 2: Diffing storage");
        Scanner::new(
            self.storage.as_ref(),
            &self.registry,
            self.settings.scan_concurrency,
        )
        .run(prior_labels)
        .await
    }

    // ========================================================================
    // Index
    // ========================================================================

    /// Build a corpus from the pending scan and start training on it.
    ///
    /// Returns as soon as the trainer accepted the job. `on_complete` is
    /// invoked from a background task once the job leaves `Training`.
    ///
    /// # Errors
    ///
    /// Fails when the trainer cannot be reached, rejects the submission, or
    /// reports the new job in a status other than `Training`.
    #[instrument(skip(self, on_complete))]
    pub async fn index(&self, on_complete: Option<CompletionCallback>) -> Result<IndexSummary> {
        let (_guard, scan) = {
            let mut state = lock_state(&self.state);
            match state.run_state {
                RunState::Idle => {}
                RunState::Scanning => {
                    info!("Index requested while scanning");
                    return Ok(IndexSummary::limited(LimitReason::BlockedByScan));
                }
                RunState::Indexing => {
                    info!("Index requested while indexing");
                    return Ok(IndexSummary::limited(LimitReason::IndexInProgress));
                }
            }
            let scan = match &state.scan_result {
                None => return Ok(IndexSummary::limited(LimitReason::MustScanFirst)),
                Some(scan) if !scan.has_changes() => {
                    return Ok(IndexSummary::limited(LimitReason::NoChanges))
                }
                Some(scan) => Arc::clone(scan),
            };
            state.status.index_started_at = Some(self.clock.now());
            (
                RunGuard::enter(&self.state, &mut state, RunState::Indexing),
                scan,
            )
        };

        self.emit(CoreEvent::Training(TrainingEvent::IndexStarted));

        let result = self.run_index(&scan, on_complete).await;
        if let Err(e) = &result {
            error!(operation = "index", error = %e, "Indexing failed");
        }
        result
    }

    async fn run_index(
        &self,
        scan: &ScanResult,
        on_complete: Option<CompletionCallback>,
    ) -> Result<IndexSummary> {
        info!("Phase 1: Checking trainer for an active job");
        let jobs = self.trainer.list_jobs().await.map_err(IndexError::Trainer)?;
        if let Some(active) = training_in_progress(&jobs) {
            info!(job_id = %active.id, "Trainer is already training");
            return Ok(IndexSummary::limited(LimitReason::AlreadyTraining));
        }

        info!(
            additions = scan.additions(),
            unchanged = scan.unchanged(),
            "Phase 2: Building training corpus"
        );
        let report = CorpusBuilder::new(&self.registry, self.settings.index_concurrency)
            .build(scan)
            .await;
        if report.corpus.is_empty() {
            warn!(failed = report.failed, "Corpus is empty, nothing to train");
            return Ok(IndexSummary::limited(LimitReason::NoTrainingData));
        }

        let rows = report.corpus.len();
        info!(rows, "Phase 3: Submitting training job");
        let training_data = report
            .corpus
            .to_csv()
            .map_err(|e| IndexError::Serialization(e.to_string()))?;
        let job = self
            .trainer
            .submit_job(training_data)
            .await
            .map_err(IndexError::Trainer)?;

        if job.status != JobStatus::Training {
            return Err(IndexError::TrainingNotStarted {
                job_id: job.id,
                status: job.status,
            });
        }

        lock_state(&self.state).scan_result = None;
        self.emit(CoreEvent::Training(TrainingEvent::Submitted {
            job_id: job.id.clone(),
            rows,
        }));
        self.spawn_watch(job.id.clone(), on_complete);

        info!(job_id = %job.id, rows, "Training started");
        Ok(IndexSummary::started(&job, rows))
    }

    /// Detached task that waits for the job to finish
    fn spawn_watch(&self, job_id: String, on_complete: Option<CompletionCallback>) {
        let trainer = Arc::clone(&self.trainer);
        let event_bus = self.event_bus.clone();

        tokio::spawn(async move {
            let outcome = trainer.watch_job(&job_id).await.map_err(IndexError::Trainer);

            let event = match &outcome {
                Ok(job) => {
                    info!(job_id = %job.id, status = %job.status, "Training job finished");
                    TrainingEvent::Completed {
                        job_id: job.id.clone(),
                        status: job.status.to_string(),
                    }
                }
                Err(e) => {
                    error!(job_id = %job_id, error = %e, "Watching training job failed");
                    TrainingEvent::Failed {
                        job_id: job_id.clone(),
                        message: e.to_string(),
                    }
                }
            };
            if let Some(bus) = &event_bus {
                bus.emit(CoreEvent::Training(event)).ok();
            }

            if let Some(callback) = on_complete {
                callback(outcome);
            }
        });
    }

    // ========================================================================
    // Classify & Status
    // ========================================================================

    /// Find the objects best matching a free-text description.
    ///
    /// # Errors
    ///
    /// `IndexError::InvalidInput` for blank text; trainer failures other than
    /// "nothing trained yet".
    #[instrument(skip(self))]
    pub async fn classify(&self, text: &str, include_training_data: bool) -> Result<ClassifySummary> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IndexError::InvalidInput("search text is empty".to_string()));
        }

        let job = match self.trainer.current_selected_job().await {
            Ok(job) => job,
            Err(BridgeError::NotFound(message)) => {
                debug!(reason = %message, "No classifier selected");
                return Ok(ClassifySummary::limited(LimitReason::IndexNotStarted));
            }
            Err(e) => return Err(IndexError::Trainer(e)),
        };
        if job.status == JobStatus::Training {
            return Ok(ClassifySummary::limited(LimitReason::StillTraining));
        }

        let response = self
            .trainer
            .classify(text)
            .await
            .map_err(IndexError::Trainer)?;

        let training_data = if include_training_data {
            match self.trainer.get_corpus(&response.job_id).await {
                Ok(labels) => Some(labels),
                Err(e) => {
                    warn!(job_id = %response.job_id, error = %e, "Training data unavailable");
                    None
                }
            }
        } else {
            None
        };

        Ok(ClassifySummary::classified(ClassifyResult::new(
            response,
            training_data.as_ref(),
        )))
    }

    /// When the last scan and index started.
    ///
    /// Falls back to the creation time of the most recent usable trainer job
    /// when this process has not indexed yet; that value is an estimate.
    ///
    /// # Errors
    ///
    /// Fails when the fallback cannot list trainer jobs.
    #[instrument(skip(self))]
    pub async fn get_status(&self) -> Result<EngineStatus> {
        {
            let state = lock_state(&self.state);
            if state.status.index_started_at.is_some() {
                return Ok(state.status.clone());
            }
        }

        let jobs = self.trainer.list_jobs().await.map_err(IndexError::Trainer)?;

        let mut state = lock_state(&self.state);
        if let Some(job) = most_recent_usable(&jobs) {
            debug!(job_id = %job.id, created = %job.created, "Estimating status from trainer job");
            state.status.index_started_at.get_or_insert(job.created);
            state.status.scan_started_at.get_or_insert(job.created);
        }
        Ok(state.status.clone())
    }

    fn emit(&self, event: CoreEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event).ok();
        }
    }
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("run_state", &self.run_state())
            .finish()
    }
}
