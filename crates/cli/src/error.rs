//! CLI error types

use std::path::PathBuf;

use sample_factory_core::{AnalysisError, FactoryError, SpecError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Write(#[from] std::io::Error),

    #[error("Invalid --set argument '{0}': expected KEY=VALUE")]
    InvalidAssignment(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    #[error("Generation failed: {0}")]
    Factory(#[from] FactoryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
