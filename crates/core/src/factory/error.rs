//! Error types for record generation

use thiserror::Error;

use crate::spec::SpecError;

/// Error returned by fallible override callables
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while generating records
#[derive(Error, Debug)]
pub enum FactoryError {
    /// Override key does not address anything in the spec
    #[error("Invalid override path '{key}': {reason}")]
    OverridePath { key: String, reason: String },

    /// A user callable failed
    #[error("Override at {path} failed: {source}")]
    Override {
        path: String,
        #[source]
        source: BoxError,
    },

    /// Spec error
    #[error(transparent)]
    Spec(#[from] SpecError),
}
