//! Natural language classifier connector
//!
//! Implements `Trainer` against the classifier REST API. Each training job
//! is a classifier instance; only instances named after the configured
//! classifier name belong to this deployment.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::trainer::{
    ClassifyResponse, CorpusLabels, CorpusStore, JobStatus, Trainer, TrainingCorpus, TrainingJob,
};
use bytes::Bytes;
use core_runtime::config::TrainerSettings;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{NlcError, Result};
use crate::types::{
    ClassificationResult, ClassifierDetail, ClassifierList, ClassifyRequest, MultipartForm,
    TrainingMetadata,
};

/// Classifier service connector
///
/// # Example
///
/// ```ignore
/// use provider_nlc::{InMemoryCorpusStore, NlcConnector};
/// use bridge_traits::trainer::Trainer;
///
/// let trainer = NlcConnector::new(http_client, config.trainer.clone(), Arc::new(InMemoryCorpusStore::new()));
/// let job = trainer.submit_job(corpus.to_csv()?).await?;
/// let finished = trainer.watch_job(&job.id).await?;
/// ```
pub struct NlcConnector {
    http_client: Arc<dyn HttpClient>,
    settings: TrainerSettings,
    corpus_store: Arc<dyn CorpusStore>,
}

impl NlcConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        settings: TrainerSettings,
        corpus_store: Arc<dyn CorpusStore>,
    ) -> Self {
        Self {
            http_client,
            settings,
            corpus_store,
        }
    }

    fn classifiers_url(&self) -> String {
        format!("{}/v1/classifiers", self.settings.url)
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .basic_auth(&self.settings.username, &self.settings.password)
            .header("Accept", "application/json")
    }

    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.http_client.execute(request).await?;
        match response.status {
            401 | 403 => Err(NlcError::AuthenticationFailed {
                status_code: response.status,
            }),
            _ => Ok(response),
        }
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
        if !response.is_success() {
            return Err(NlcError::ApiError {
                status_code: response.status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        serde_json::from_slice(&response.body).map_err(|e| NlcError::ParseError(e.to_string()))
    }

    /// `Ok(None)` when the classifier disappeared between listing and lookup
    async fn classifier_detail(&self, classifier_id: &str) -> Result<Option<ClassifierDetail>> {
        let url = format!("{}/{}", self.classifiers_url(), classifier_id);
        let response = self.execute(self.request(HttpMethod::Get, url)).await?;
        if response.status == 404 {
            return Ok(None);
        }
        Self::parse(&response).map(Some)
    }

    async fn job(&self, job_id: &str) -> Result<TrainingJob> {
        self.classifier_detail(job_id)
            .await?
            .map(TrainingJob::from)
            .ok_or_else(|| NlcError::ClassifierNotFound(job_id.to_string()))
    }

    async fn jobs(&self) -> Result<Vec<TrainingJob>> {
        let response = self
            .execute(self.request(HttpMethod::Get, self.classifiers_url()))
            .await?;
        let list: ClassifierList = Self::parse(&response)?;

        let ours = list
            .classifiers
            .into_iter()
            .filter(|c| c.name.as_deref() == Some(self.settings.classifier_name.as_str()));
        let details = try_join_all(ours.map(|c| async move {
            self.classifier_detail(&c.classifier_id).await
        }))
        .await?;

        Ok(details.into_iter().flatten().map(TrainingJob::from).collect())
    }

    async fn newest_with_status(&self, status: JobStatus) -> Result<TrainingJob> {
        newest(&self.jobs().await?, &status)
            .cloned()
            .ok_or_else(|| NlcError::NoClassifier {
                name: self.settings.classifier_name.clone(),
                status: status.as_str(),
            })
    }
}

fn newest<'a>(jobs: &'a [TrainingJob], status: &JobStatus) -> Option<&'a TrainingJob> {
    jobs.iter()
        .filter(|job| &job.status == status)
        .max_by_key(|job| job.created)
}

#[async_trait]
impl Trainer for NlcConnector {
    #[instrument(skip(self), fields(classifier = %self.settings.classifier_name))]
    async fn list_jobs(&self) -> BridgeResult<Vec<TrainingJob>> {
        let jobs = self.jobs().await?;
        debug!(count = jobs.len(), "Listed classifiers");
        Ok(jobs)
    }

    #[instrument(skip(self))]
    async fn get_corpus(&self, job_id: &str) -> BridgeResult<CorpusLabels> {
        let data = self
            .corpus_store
            .load(job_id)
            .await?
            .ok_or_else(|| NlcError::CorpusNotFound {
                job_id: job_id.to_string(),
            })?;

        let labels = TrainingCorpus::from_csv(&data)?.labels_by_path();
        debug!(paths = labels.len(), "Loaded stored corpus");
        Ok(labels)
    }

    #[instrument(skip(self, training_data), fields(bytes = training_data.len()))]
    async fn submit_job(&self, training_data: Bytes) -> BridgeResult<TrainingJob> {
        let metadata = serde_json::to_vec(&TrainingMetadata {
            language: &self.settings.language,
            name: &self.settings.classifier_name,
        })
        .map_err(|e| NlcError::ParseError(e.to_string()))?;

        let form = MultipartForm::new()
            .part("training_metadata", "application/json", &metadata)
            .part("training_data", "text/csv", &training_data);
        let request = self
            .request(HttpMethod::Post, self.classifiers_url())
            .header("Content-Type", form.content_type())
            .body(form.finish());

        let response = self.execute(request).await?;
        let job: TrainingJob = Self::parse::<ClassifierDetail>(&response)?.into();
        if job.status != JobStatus::Training {
            return Err(NlcError::TrainingNotStarted {
                job_id: job.id,
                status: job.status.to_string(),
            }
            .into());
        }
        info!(job_id = %job.id, "Classifier training started");

        // Training is already running; without the copy the next scan treats
        // every object as new.
        if let Err(e) = self.corpus_store.save(&job.id, training_data).await {
            warn!(job_id = %job.id, error = %e, "Failed to store training corpus");
        }
        Ok(job)
    }

    #[instrument(skip(self))]
    async fn watch_job(&self, job_id: &str) -> BridgeResult<TrainingJob> {
        loop {
            let job = self.job(job_id).await?;
            if job.status != JobStatus::Training {
                info!(status = %job.status, "Classifier left training");
                return Ok(job);
            }
            debug!(poll_interval = ?self.settings.poll_interval, "Classifier still training");
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    async fn current_selected_job(&self) -> BridgeResult<TrainingJob> {
        let jobs = self.jobs().await?;
        newest(&jobs, &JobStatus::Available)
            .or_else(|| newest(&jobs, &JobStatus::Training))
            .cloned()
            .ok_or_else(|| {
                NlcError::NoClassifier {
                    name: self.settings.classifier_name.clone(),
                    status: "Available or Training",
                }
                .into()
            })
    }

    #[instrument(skip(self, text))]
    async fn classify(&self, text: &str) -> BridgeResult<ClassifyResponse> {
        let job = self.newest_with_status(JobStatus::Available).await?;
        let url = format!("{}/{}/classify", self.classifiers_url(), job.id);
        let request = self
            .request(HttpMethod::Post, url)
            .json(&ClassifyRequest { text })?;

        let response = self.execute(request).await?;
        let result: ClassificationResult = Self::parse(&response)?;
        debug!(job_id = %job.id, top_class = %result.top_class, "Classified text");
        Ok(result.into())
    }
}
