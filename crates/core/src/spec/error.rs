//! Error types for spec loading and validation

use thiserror::Error;

/// Errors raised while reading or checking a spec document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    /// Malformed document, unknown hint kind or bad hint parameters
    #[error("Invalid spec at {path}: {message}")]
    Format { path: String, message: String },

    /// Structurally inconsistent node or metadata
    #[error("Inconsistent spec shape at {path}: {message}")]
    Shape { path: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl SpecError {
    pub(crate) fn format(path: impl Into<String>, message: impl Into<String>) -> Self {
        SpecError::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn shape(path: impl Into<String>, message: impl Into<String>) -> Self {
        SpecError::Shape {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SpecError {
    fn from(e: serde_json::Error) -> Self {
        SpecError::format("$", e.to_string())
    }
}

impl From<std::io::Error> for SpecError {
    fn from(e: std::io::Error) -> Self {
        SpecError::Io(e.to_string())
    }
}
