//! Error types for the Swift provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwiftError {
    /// Keystone rejected the credentials or returned no usable token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service catalog has no public object-store endpoint for the region
    #[error("No public object-store endpoint for region {region}")]
    EndpointNotFound { region: String },

    #[error("Container {container} was not found (status {status_code})")]
    ContainerNotFound { container: String, status_code: u16 },

    #[error("Object {path} was not found (status {status_code})")]
    ObjectNotFound { path: String, status_code: u16 },

    #[error("Swift API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SwiftError>;

impl From<SwiftError> for BridgeError {
    fn from(error: SwiftError) -> Self {
        match error {
            SwiftError::AuthenticationFailed(msg) => BridgeError::Unauthorized(msg),
            e @ SwiftError::EndpointNotFound { .. } => BridgeError::Unauthorized(e.to_string()),
            e @ (SwiftError::ContainerNotFound { .. } | SwiftError::ObjectNotFound { .. }) => {
                BridgeError::NotFound(e.to_string())
            }
            e @ (SwiftError::ApiError { .. } | SwiftError::ParseError(_)) => {
                BridgeError::OperationFailed(e.to_string())
            }
            SwiftError::Bridge(e) => e,
        }
    }
}
