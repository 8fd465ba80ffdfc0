//! Error types for the observation access layer.

use thiserror::Error;

/// Result type alias using ObsError.
pub type ObsResult<T> = Result<T, ObsError>;

/// Primary error type for observation store, distribution and backend
/// operations.
#[derive(Debug, Error)]
pub enum ObsError {
    // === Container Errors ===
    #[error("Variable '{variable}' in group '{group}' already exists")]
    DuplicateKey { group: String, variable: String },

    #[error("Attribute '{0}' already exists")]
    DuplicateAttribute(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Type mismatch for '{name}': requested {requested}, stored {stored}")]
    TypeMismatch {
        name: String,
        requested: String,
        stored: String,
    },

    #[error("Invalid shape for '{name}': {message}")]
    InvalidShape { name: String, message: String },

    #[error("Record '{0}' is read-only")]
    ReadOnly(String),

    // === Backend Errors ===
    #[error("Backend I/O failure in {operation} on '{dataset}': {message}")]
    BackendIo {
        operation: String,
        dataset: String,
        message: String,
    },

    #[error("Unrecognized file mode: '{0}' (must be one of: 'r', 'w', 'W')")]
    UnrecognizedMode(String),

    #[error("Unrecognized file format: {0}")]
    UnrecognizedFormat(String),

    #[error("Invalid schema in '{dataset}': {message}")]
    InvalidSchema { dataset: String, message: String },

    #[error("Unsupported element type for '{name}': {message}")]
    UnsupportedType { name: String, message: String },

    // === Time Errors ===
    #[error("Invalid reference time encoding: {0}")]
    InvalidReferenceTime(i32),
}

impl ObsError {
    /// Shorthand for a backend I/O failure tied to one operation and dataset.
    pub fn backend_io(
        operation: impl Into<String>,
        dataset: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        ObsError::BackendIo {
            operation: operation.into(),
            dataset: dataset.into(),
            message: message.to_string(),
        }
    }
}
