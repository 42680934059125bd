//! Error types for the classifier provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NlcError {
    #[error("Classifier service rejected credentials (status {status_code})")]
    AuthenticationFailed { status_code: u16 },

    #[error("Classifier {0} was not found")]
    ClassifierNotFound(String),

    /// No classifier with the configured name is in a usable state
    #[error("No {status} classifier named {name}")]
    NoClassifier { name: String, status: &'static str },

    /// Submitted training data was never stored for this classifier
    #[error("No stored training data for classifier {job_id}")]
    CorpusNotFound { job_id: String },

    /// The service accepted the request but did not start training
    #[error("Classifier {job_id} did not start training (status {status})")]
    TrainingNotStarted { job_id: String, status: String },

    #[error("Classifier API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, NlcError>;

impl From<NlcError> for BridgeError {
    fn from(error: NlcError) -> Self {
        match error {
            e @ NlcError::AuthenticationFailed { .. } => BridgeError::Unauthorized(e.to_string()),
            e @ (NlcError::ClassifierNotFound(_)
            | NlcError::NoClassifier { .. }
            | NlcError::CorpusNotFound { .. }) => BridgeError::NotFound(e.to_string()),
            e @ (NlcError::TrainingNotStarted { .. }
            | NlcError::ApiError { .. }
            | NlcError::ParseError(_)) => BridgeError::OperationFailed(e.to_string()),
            NlcError::Bridge(e) => e,
        }
    }
}
