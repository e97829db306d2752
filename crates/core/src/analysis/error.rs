//! Error types for sample analysis

use thiserror::Error;

/// Errors that can occur while building a spec from samples
#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Invalid JSON structure (not an object at root)
    #[error("Invalid JSON structure: expected object at root, found {0}")]
    InvalidStructure(String),

    /// No usable records to analyze
    #[error("No records provided for analysis")]
    NoRecords,

    /// Record model could not be read
    #[error("Invalid record model: {0}")]
    RecordModel(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::JsonParse(e.to_string())
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        AnalysisError::Io(e.to_string())
    }
}
