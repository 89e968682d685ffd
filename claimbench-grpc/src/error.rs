//! gRPC error types

use thiserror::Error;

/// Errors raised below the submitter boundary
#[derive(Debug, Error)]
pub enum GrpcError {
    #[error("Invalid gRPC target '{target}': {message}")]
    InvalidTarget { target: String, message: String },

    #[error("Failed to connect to {target}: {message}")]
    Connect { target: String, message: String },

    #[error("Call failed with status {code:?}: {message}")]
    Status { code: tonic::Code, message: String },
}

impl From<tonic::Status> for GrpcError {
    fn from(status: tonic::Status) -> Self {
        Self::Status {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}
