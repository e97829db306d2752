//! The spec tree
//!
//! A [`Spec`] mirrors the shape of the sampled records. Leaves carry a
//! [`Hint`]; inner nodes describe objects, positional arrays, variable
//! arrays and dynamic-key mappings. Every node carries the probability of
//! being missing from its parent and of being null when present.

mod builder;
mod error;
mod loader;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::hints::{Hint, NumberParams};
use crate::path::{PathSegment, RecordPath};

pub use builder::{AnalysisStats, SpecBuilder, create_spec};
pub use error::SpecError;

/// Wire format version written by this crate
pub const SPEC_VERSION: u32 = 1;

/// Summary of the analysis that produced a spec
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecMetadata {
    /// Records the spec was learned from
    pub samples_analyzed: usize,
    /// Values observed across those records
    pub data_points: usize,
    /// Values no analyzer could classify
    pub unclassifiable: usize,
    pub version: u32,
}

/// Missing and null probabilities of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Presence {
    #[serde(skip_serializing_if = "is_zero")]
    pub missing: f64,
    #[serde(skip_serializing_if = "is_zero")]
    pub null: f64,
}

impl Presence {
    pub fn always() -> Self {
        Self::default()
    }
}

/// Structure of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum Shape {
    /// Scalar leaf
    Value { hint: Hint },
    /// Object with named fields
    Object { fields: BTreeMap<String, SpecNode> },
    /// Array with a per-position element spec
    Fixed { length: usize, elements: Vec<SpecNode> },
    /// Array of homogeneous elements with a length distribution
    Variable {
        length: NumberParams,
        element: Box<SpecNode>,
    },
    /// Object whose keys are data
    DynamicKeys {
        count: NumberParams,
        key: Hint,
        value: Box<SpecNode>,
    },
}

/// One node of the spec tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecNode {
    #[serde(flatten)]
    pub presence: Presence,
    #[serde(flatten)]
    pub shape: Shape,
}

impl SpecNode {
    pub fn new(shape: Shape) -> Self {
        Self {
            presence: Presence::always(),
            shape,
        }
    }

    /// Scalar leaf
    pub fn value(hint: Hint) -> Self {
        Self::new(Shape::Value { hint })
    }

    /// Leaf that is always null
    pub fn null() -> Self {
        Self {
            presence: Presence {
                missing: 0.0,
                null: 1.0,
            },
            shape: Shape::Value {
                hint: Hint::Constant { value: Value::Null },
            },
        }
    }

    pub fn object(fields: BTreeMap<String, SpecNode>) -> Self {
        Self::new(Shape::Object { fields })
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    /// Child node reached by one concrete path segment
    pub fn child(&self, segment: &PathSegment) -> Option<&SpecNode> {
        match (&self.shape, segment) {
            (Shape::Object { fields }, PathSegment::Key(key)) => fields.get(key),
            (Shape::Object { fields }, PathSegment::Index(index)) => {
                fields.get(&index.to_string())
            }
            (Shape::Fixed { elements, .. }, PathSegment::Index(index)) => elements.get(*index),
            (Shape::Variable { element, .. }, PathSegment::Index(_)) => Some(element.as_ref()),
            (Shape::DynamicKeys { value, .. }, _) => Some(value.as_ref()),
            _ => None,
        }
    }
}

/// A complete spec document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spec {
    pub metadata: SpecMetadata,
    pub root: SpecNode,
}

impl Spec {
    /// Parse and validate a spec document
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Build and validate a spec from a parsed document
    pub fn from_value(value: &Value) -> Result<Self, SpecError> {
        let spec = loader::load_spec(value)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Read a spec file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check the tree and metadata for consistency
    pub fn validate(&self) -> Result<(), SpecError> {
        loader::validate_spec(self)
    }

    pub fn to_value(&self) -> Result<Value, SpecError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String, SpecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the spec to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SpecError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Node at an override-style key such as `items__0__name`
    pub fn node(&self, key: &str) -> Option<&SpecNode> {
        let path = RecordPath::parse_key(key)?;
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// Hint of the leaf at an override-style key
    pub fn hint(&self, key: &str) -> Option<&Hint> {
        match &self.node(key)?.shape {
            Shape::Value { hint } => Some(hint),
            _ => None,
        }
    }
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}
