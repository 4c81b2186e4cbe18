//! Errors raised by the value tree and the test helpers

#[derive(Debug, thiserror::Error)]
pub enum TfplugError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Type mismatch at {path}: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// A write could not follow the path, e.g. an index past the end of a list
    #[error("Cannot set {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid version \"{0}\"")]
    InvalidVersion(String),

    #[error("Invalid version constraint \"{0}\"")]
    InvalidConstraint(String),
}

pub type Result<T> = std::result::Result<T, TfplugError>;
