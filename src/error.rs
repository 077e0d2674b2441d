//! Error types for the IONOS Cloud provider.

use thiserror::Error;

use crate::api::ApiError;

/// Errors that can occur while handling a provider operation.
///
/// Errors raised inside CRUD handlers are converted into diagnostics at the
/// gRPC boundary; the `tonic::Status` conversion exists for transport-level
/// failures.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested remote object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The configuration is invalid (user error, never retried).
    #[error("validation error: {0}")]
    Validation(String),

    /// The provider is misconfigured (credentials, endpoints).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is not registered.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A malformed request from the host (e.g. a bad import identifier).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A state-change wait ran out of budget.
    #[error("timeout: {0}")]
    DeadlineExceeded(String),

    /// An upstream IONOS API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A state or configuration payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// An invariant inside the provider itself was broken.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownType(msg) => tonic::Status::not_found(msg),
            ProviderError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::DeadlineExceeded(msg) => tonic::Status::deadline_exceeded(msg),
            ProviderError::Api(err) => api_status(err),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("serialization error: {}", err))
            }
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("transport error: {}", err))
            }
            ProviderError::Internal(msg) => tonic::Status::internal(msg),
        }
    }
}

fn api_status(err: ApiError) -> tonic::Status {
    match &err {
        ApiError::NotFound { .. } => tonic::Status::not_found(err.to_string()),
        ApiError::Status { status, .. } => {
            if status.as_u16() == 401 || status.as_u16() == 403 {
                tonic::Status::permission_denied(err.to_string())
            } else if status.as_u16() == 429 {
                tonic::Status::resource_exhausted(err.to_string())
            } else if status.is_server_error() {
                tonic::Status::unavailable(err.to_string())
            } else {
                tonic::Status::internal(err.to_string())
            }
        }
        ApiError::Http(_) => tonic::Status::unavailable(err.to_string()),
        ApiError::Decode(_) | ApiError::Endpoint(_) => tonic::Status::internal(err.to_string()),
    }
}
