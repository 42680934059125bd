use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    /// Every object would be unsupported, so scans could never find work
    #[error("No tag generators configured: provide an image analyzer or a keyword extractor")]
    NoTagGenerators,

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Index error: {0}")]
    Index(#[from] core_index::IndexError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
