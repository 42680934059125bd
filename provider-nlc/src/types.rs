//! Classifier service wire types

use bridge_traits::trainer::{ClassScore, ClassifyResponse, JobStatus, TrainingJob};
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `GET /v1/classifiers`
#[derive(Debug, Deserialize)]
pub struct ClassifierList {
    #[serde(default)]
    pub classifiers: Vec<ClassifierSummary>,
}

/// Listing entry; carries no status
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierSummary {
    pub classifier_id: String,
    pub name: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

/// `GET /v1/classifiers/{id}` and the training submission response
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierDetail {
    pub classifier_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub status_description: Option<String>,
    pub created: DateTime<Utc>,
}

impl From<ClassifierDetail> for TrainingJob {
    fn from(detail: ClassifierDetail) -> Self {
        TrainingJob {
            id: detail.classifier_id,
            name: detail.name.unwrap_or_default(),
            status: detail.status,
            created: detail.created,
        }
    }
}

/// `training_metadata` part of a training submission
#[derive(Debug, Serialize)]
pub struct TrainingMetadata<'a> {
    pub language: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ClassifyRequest<'a> {
    pub text: &'a str,
}

/// `POST /v1/classifiers/{id}/classify`
#[derive(Debug, Deserialize)]
pub struct ClassificationResult {
    pub classifier_id: String,
    pub text: String,
    pub top_class: String,
    #[serde(default)]
    pub classes: Vec<ClassifiedClass>,
}

#[derive(Debug, Deserialize)]
pub struct ClassifiedClass {
    pub class_name: String,
    pub confidence: f64,
}

impl From<ClassificationResult> for ClassifyResponse {
    fn from(result: ClassificationResult) -> Self {
        ClassifyResponse {
            job_id: result.classifier_id,
            text: result.text,
            top_class: result.top_class,
            classes: result
                .classes
                .into_iter()
                .map(|c| ClassScore {
                    label: c.class_name,
                    confidence: c.confidence,
                })
                .collect(),
        }
    }
}

/// `multipart/form-data` body with named parts
///
/// Encoded here because `HttpRequest` carries only a raw `Bytes` body, so
/// reqwest's multipart support is not reachable through the `HttpClient` bridge.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    body: BytesMut,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("os-search-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: BytesMut::new(),
        }
    }

    pub fn part(mut self, name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.put_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.put_slice(data);
        self.body.put_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Bytes {
        self.body
            .put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body.freeze()
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}
