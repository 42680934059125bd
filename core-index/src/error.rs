use bridge_traits::error::BridgeError;
use bridge_traits::trainer::JobStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Storage error: {0}")]
    Storage(#[source] BridgeError),

    #[error("Trainer error: {0}")]
    Trainer(#[source] BridgeError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Training job {job_id} did not start (status: {status})")]
    TrainingNotStarted { job_id: String, status: JobStatus },

    #[error("Corpus serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
