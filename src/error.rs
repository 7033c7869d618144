use std::io;

use serde::Serialize;
use thiserror::Error;

/// Error tag reported in API error payloads
pub const ERROR_TAG: &str = "FuseFilesystem";

/// Main error type for fuse-filesystem operations
#[derive(Error, Debug)]
pub enum FuseFilesystemError {
    #[error("No such file found at \"{0}\"")]
    NotFound(String),

    #[error("Permission denied.")]
    PermissionDenied,

    #[error("Unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Wire representation of an error, sent as the JSON body of a failed
/// API response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub tag: String,
    pub code: u32,
    pub message: String,
}

impl FuseFilesystemError {
    /// Stable error code reported to API clients
    pub fn code(&self) -> u32 {
        match self {
            FuseFilesystemError::NotFound(_) => 1,
            FuseFilesystemError::PermissionDenied => 2,
            FuseFilesystemError::UnsupportedScheme(_) => 3,
            FuseFilesystemError::InvalidUri(_) => 4,
            FuseFilesystemError::InvalidParams(_) => 5,
            FuseFilesystemError::UnknownEndpoint(_) => 6,
            FuseFilesystemError::Io(_) => 7,
            FuseFilesystemError::Config(_) => 8,
        }
    }

    /// HTTP status used when this error is sent over the API bridge
    pub fn http_status(&self) -> u16 {
        match self {
            FuseFilesystemError::NotFound(_) => 404,
            FuseFilesystemError::UnknownEndpoint(_) => 404,
            FuseFilesystemError::PermissionDenied => 403,
            FuseFilesystemError::UnsupportedScheme(_) => 400,
            FuseFilesystemError::InvalidUri(_) => 400,
            FuseFilesystemError::InvalidParams(_) => 400,
            FuseFilesystemError::Io(_) => 500,
            FuseFilesystemError::Config(_) => 500,
        }
    }

    /// Build the JSON payload for a failed API response
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            tag: ERROR_TAG.to_string(),
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Result type alias for fuse-filesystem operations
pub type Result<T> = std::result::Result<T, FuseFilesystemError>;
