use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaggingError {
    #[error("{path} with content-type '{content_type}' is not valid for the {generator} generator")]
    Unsupported {
        generator: String,
        path: String,
        content_type: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] BridgeError),

    #[error("Analysis service failed: {0}")]
    Analysis(String),

    #[error("Document could not be read: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, TaggingError>;
