//! Sample Factory Core - learn record specs from samples and generate from them
//!
//! Provides:
//! - Flattening of nested JSON samples into per-path populations
//! - Analyzers that fit a generation hint to each population
//! - A serializable spec tree with a validating loader
//! - A seeded record factory with path-addressed overrides

pub mod analysis;
pub mod extract;
pub mod factory;
pub mod hints;
pub mod path;
pub mod schema;
pub mod spec;

// Re-export commonly used types
pub use analysis::{AnalysisConfig, AnalysisConfigBuilder, AnalysisError, AnalyzerKind};
pub use factory::{Factory, FactoryError, Override, Overrides};
pub use hints::{Hint, ValueGenerator};
pub use path::{FieldPath, RecordPath};
pub use schema::{JsonSchemaModel, OpenMappings, RecordModel};
pub use spec::{AnalysisStats, Shape, Spec, SpecBuilder, SpecError, SpecNode, create_spec};
