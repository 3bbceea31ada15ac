//! Error types for Cropwatch

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CropwatchError {
    // Form errors
    #[error("{reason}")]
    Validation { field: String, reason: String },

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    // Remote call errors
    #[error("{operation} failed: {reason}")]
    Network { operation: String, reason: String },

    #[error("Remote service returned {status}: {detail}")]
    Remote { status: u16, detail: String },

    #[error("No results found for \"{query}\"")]
    NoResults { query: String },

    #[error("Analysis job {job_id} failed: {reason}")]
    RemoteJob { job_id: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Config file not found at {path}")]
    ConfigFileNotFound { path: PathBuf },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification used by the UI layer to choose how an error is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blocks submission; shown inline next to the form
    Validation,
    /// Transient remote failure; shown as a banner, recoverable by retrying
    Network,
    /// Informational; the lookup succeeded but matched nothing
    NoResults,
    /// The job reached `failed`; a new submission is required
    RemoteJob,
    Internal,
}

impl CropwatchError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn network(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network { operation: operation.into(), reason: reason.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::SubmissionInFlight | Self::InvalidGeometry { .. } => {
                ErrorKind::Validation
            }
            Self::Network { .. } | Self::Remote { .. } => ErrorKind::Network,
            Self::NoResults { .. } => ErrorKind::NoResults,
            Self::RemoteJob { .. } => ErrorKind::RemoteJob,
            _ => ErrorKind::Internal,
        }
    }

    /// Message suitable for showing to the user as-is.
    ///
    /// Remote errors surface the server's own detail text; everything else
    /// uses the display form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { detail, .. } if !detail.is_empty() => detail.clone(),
            Self::Remote { .. } => "The analysis service returned an error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for CropwatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CropwatchError>;
