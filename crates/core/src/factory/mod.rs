//! Record generation from a spec
//!
//! A [`Factory`] walks the spec tree depth-first for every record. Presence
//! is sampled before anything else, so a field that comes out missing or
//! null is left alone and overrides aimed at it are not applied for that
//! record. A literal override stands in for a whole subtree, and overrides
//! on paths inside it are then applied to the literal. Context-aware
//! overrides run after the rest of the record is built, in traversal order.
//!
//! The factory owns one seeded random source that carries across calls.
//! [`Factory::with_seed`] gives reproducible sequences; [`Factory::new`]
//! seeds from OS entropy.
//!
//! # Example
//!
//! ```
//! use sample_factory_core::factory::{Factory, Overrides};
//! use sample_factory_core::spec::create_spec;
//! use sample_factory_core::analysis::AnalysisConfig;
//! use serde_json::json;
//!
//! let samples: Vec<_> = (0..20).map(|i| json!({"id": i, "role": "user"})).collect();
//! let spec = create_spec(&samples, AnalysisConfig::default()).unwrap();
//!
//! let mut factory = Factory::with_seed(spec, 7, Overrides::new()).unwrap();
//! let record = factory.build(&Overrides::new().set("role", "admin")).unwrap();
//! assert_eq!(record["role"], "admin");
//! ```

mod error;
mod overrides;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};
use tracing::debug;

use crate::hints::{Hint, NumberParams, ValueGenerator};
use crate::path::{PathSegment, RecordPath};
use crate::spec::{Shape, Spec, SpecNode};

pub use error::{BoxError, FactoryError};
pub use overrides::{Override, Overrides};

use overrides::{Compiled, lookup};

/// Generates records from a spec
pub struct Factory {
    spec: Arc<Spec>,
    overrides: Overrides,
    compiled: Vec<Compiled>,
    rng: StdRng,
}

impl Factory {
    /// Factory seeded from OS entropy
    pub fn new(spec: Spec, overrides: Overrides) -> Result<Self, FactoryError> {
        Self::with_rng(Arc::new(spec), overrides, StdRng::from_entropy())
    }

    /// Factory with a reproducible random sequence
    pub fn with_seed(spec: Spec, seed: u64, overrides: Overrides) -> Result<Self, FactoryError> {
        Self::with_rng(Arc::new(spec), overrides, StdRng::seed_from_u64(seed))
    }

    /// Factory for a spec file
    pub fn from_path(path: impl AsRef<Path>, overrides: Overrides) -> Result<Self, FactoryError> {
        Self::new(Spec::from_path(path)?, overrides)
    }

    fn with_rng(spec: Arc<Spec>, overrides: Overrides, rng: StdRng) -> Result<Self, FactoryError> {
        spec.validate()?;
        let compiled = overrides.compile(&spec)?;
        Ok(Self {
            spec,
            overrides,
            compiled,
            rng,
        })
    }

    pub fn spec(&self) -> &Spec {
        &self.spec
    }

    /// Restart the random sequence
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Generate one record
    ///
    /// `overrides` take precedence over the factory's own.
    pub fn build(&mut self, overrides: &Overrides) -> Result<Value, FactoryError> {
        let call = overrides.compile(&self.spec)?;
        self.build_compiled(&call)
    }

    /// Generate one record with only the factory's overrides
    pub fn next_record(&mut self) -> Result<Value, FactoryError> {
        self.build_compiled(&[])
    }

    /// Generate `count` independent records
    pub fn build_batch(&mut self, count: usize, overrides: &Overrides) -> Result<Vec<Value>, FactoryError> {
        let call = overrides.compile(&self.spec)?;
        (0..count).map(|_| self.build_compiled(&call)).collect()
    }

    /// Endless stream of records
    pub fn iter(&mut self) -> impl Iterator<Item = Result<Value, FactoryError>> + '_ {
        std::iter::repeat_with(move || self.next_record())
    }

    /// A new factory for the same spec with `overrides` added to this one's
    ///
    /// The copy's random source is seeded from this factory's.
    pub fn copy(&mut self, overrides: Overrides) -> Result<Factory, FactoryError> {
        let seed = self.rng.next_u64();
        let merged = self.overrides.merged(&overrides);
        Self::with_rng(Arc::clone(&self.spec), merged, StdRng::seed_from_u64(seed))
    }

    fn build_compiled(&mut self, call: &[Compiled]) -> Result<Value, FactoryError> {
        let spec = Arc::clone(&self.spec);
        let mut run = Generation {
            rng: &mut self.rng,
            levels: [call, &self.compiled],
            deferred: Vec::new(),
        };
        let mut path = RecordPath::default();
        let mut record = run.shape(&spec.root, &mut path)?;

        let deferred = std::mem::take(&mut run.deferred);
        for (path, callable) in deferred {
            let current = path.get(&record).cloned().unwrap_or(Value::Null);
            let updated =
                callable(current, &record).map_err(|source| override_failed(&path, source))?;
            if let Some(slot) = path.get_mut(&mut record) {
                *slot = updated;
            }
        }
        Ok(record)
    }
}

fn override_failed(path: &RecordPath, source: BoxError) -> FactoryError {
    FactoryError::Override {
        path: path.to_string(),
        source,
    }
}

type Deferred = (
    RecordPath,
    Arc<dyn Fn(Value, &Value) -> Result<Value, BoxError> + Send + Sync>,
);

/// State of one record's generation
struct Generation<'a> {
    rng: &'a mut StdRng,
    levels: [&'a [Compiled]; 2],
    deferred: Vec<Deferred>,
}

impl<'a> Generation<'a> {
    /// Value of `node` at `path`, or `None` when it comes out missing
    fn node(&mut self, node: &SpecNode, path: &mut RecordPath) -> Result<Option<Value>, FactoryError> {
        if node.presence.missing > 0.0 && self.rng.gen_bool(node.presence.missing) {
            return Ok(None);
        }
        if node.presence.null > 0.0 && self.rng.gen_bool(node.presence.null) {
            return Ok(Some(Value::Null));
        }

        let Some(matched) = lookup(self.levels, path) else {
            return self.shape(node, path).map(Some);
        };
        let value = match matched.value.clone() {
            Override::Literal(mut value) => {
                self.overlay_below(matched.scope_below(self.levels), &mut value, path)?;
                value
            }
            Override::Generate(f) => f().map_err(|source| override_failed(path, source))?,
            Override::Transform(f) => {
                let generated = self.shape(node, path)?;
                f(generated).map_err(|source| override_failed(path, source))?
            }
            Override::WithContext(f) => {
                let generated = self.shape(node, path)?;
                self.deferred.push((path.clone(), f));
                generated
            }
        };
        Ok(Some(value))
    }

    /// Apply the overrides in `scope` to the inside of a literal value
    fn overlay_below(
        &mut self,
        scope: [&'a [Compiled]; 2],
        value: &mut Value,
        path: &mut RecordPath,
    ) -> Result<(), FactoryError> {
        let outer = std::mem::replace(&mut self.levels, scope);
        let result = self.overlay(value, path);
        self.levels = outer;
        result
    }

    fn overlay(&mut self, value: &mut Value, path: &mut RecordPath) -> Result<(), FactoryError> {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    path.push(PathSegment::Key(key.clone()));
                    let result = self.overlay_child(child, path);
                    path.pop();
                    result?;
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter_mut().enumerate() {
                    path.push(PathSegment::Index(index));
                    let result = self.overlay_child(child, path);
                    path.pop();
                    result?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn overlay_child(&mut self, value: &mut Value, path: &mut RecordPath) -> Result<(), FactoryError> {
        let Some(matched) = lookup(self.levels, path) else {
            return self.overlay(value, path);
        };
        match matched.value.clone() {
            Override::Literal(replacement) => {
                *value = replacement;
                self.overlay_below(matched.scope_below(self.levels), value, path)?;
            }
            Override::Generate(f) => {
                *value = f().map_err(|source| override_failed(path, source))?;
            }
            Override::Transform(f) => {
                self.overlay(value, path)?;
                let current = std::mem::take(value);
                *value = f(current).map_err(|source| override_failed(path, source))?;
            }
            Override::WithContext(f) => {
                self.overlay(value, path)?;
                self.deferred.push((path.clone(), f));
            }
        }
        Ok(())
    }

    /// Generated value of `node`, ignoring its presence
    fn shape(&mut self, node: &SpecNode, path: &mut RecordPath) -> Result<Value, FactoryError> {
        match &node.shape {
            Shape::Value { hint } => Ok(hint.generate(&mut *self.rng)),
            Shape::Object { fields } => {
                let mut map = Map::new();
                for (key, child) in fields {
                    path.push(PathSegment::Key(key.clone()));
                    let value = self.node(child, path);
                    path.pop();
                    if let Some(value) = value? {
                        map.insert(key.clone(), value);
                    }
                }
                Ok(Value::Object(map))
            }
            Shape::Fixed { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for (index, element) in elements.iter().enumerate() {
                    items.push(self.element(element, index, path)?);
                }
                Ok(Value::Array(items))
            }
            Shape::Variable { length, element } => {
                let count = length.sample_count(&mut *self.rng);
                let mut items = Vec::with_capacity(count);
                for index in 0..count {
                    items.push(self.element(element, index, path)?);
                }
                Ok(Value::Array(items))
            }
            Shape::DynamicKeys { count, key, value } => {
                let keys = self.draw_keys(count, key);
                let mut map = Map::new();
                for key in keys {
                    path.push(PathSegment::Key(key.clone()));
                    let generated = self.node(value, path);
                    path.pop();
                    if let Some(generated) = generated? {
                        map.insert(key, generated);
                    }
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn element(&mut self, node: &SpecNode, index: usize, path: &mut RecordPath) -> Result<Value, FactoryError> {
        path.push(PathSegment::Index(index));
        let value = self.node(node, path);
        path.pop();
        Ok(value?.unwrap_or(Value::Null))
    }

    /// Distinct keys for a dynamic-key object
    ///
    /// Stops early when twice the wanted number of draws yields no more new
    /// keys, e.g. for a key hint with few possible values.
    fn draw_keys(&mut self, count: &NumberParams, hint: &Hint) -> BTreeSet<String> {
        let wanted = count.sample_count(&mut *self.rng);
        let mut keys = BTreeSet::new();
        let mut attempts = 0;
        while keys.len() < wanted && attempts < 2 * wanted {
            attempts += 1;
            keys.insert(match hint.generate(&mut *self.rng) {
                Value::String(s) => s,
                other => other.to_string(),
            });
        }
        if keys.len() < wanted {
            debug!(wanted, drawn = keys.len(), "Key hint ran out of distinct keys");
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> Spec {
        Spec::from_value(&json!({
            "metadata": {"samplesAnalyzed": 10, "dataPoints": 10, "unclassifiable": 0},
            "root": {"shape": "object", "fields": {
                "id": {"shape": "value", "hint": {"type": "NUMBER", "min": 1, "max": 1000, "integer": true}},
                "role": {"shape": "value", "hint": {"type": "CHOICE", "choices": ["user", "guest"], "weights": [0.5, 0.5]}},
                "nick": {"shape": "value", "missing": 1.0, "hint": {"type": "CONST", "value": "x"}},
                "items": {
                    "shape": "variable",
                    "length": {"min": 3, "max": 3, "integer": true},
                    "element": {"shape": "object", "fields": {
                        "name": {"shape": "value", "hint": {"type": "CONST", "value": "n"}}
                    }}
                },
                "labels": {
                    "shape": "dynamic-keys",
                    "count": {"min": 4, "max": 4, "integer": true},
                    "key": {"type": "CHOICE", "choices": ["a", "b"], "weights": [0.5, 0.5]},
                    "value": {"shape": "value", "hint": {"type": "CONST", "value": true}}
                }
            }}
        }))
        .unwrap()
    }

    #[test]
    fn test_seeded_factories_agree() {
        let mut a = Factory::with_seed(spec(), 11, Overrides::new()).unwrap();
        let mut b = Factory::with_seed(spec(), 11, Overrides::new()).unwrap();
        for _ in 0..5 {
            assert_eq!(a.next_record().unwrap(), b.next_record().unwrap());
        }
    }

    #[test]
    fn test_reseed_restarts_sequence() {
        let mut factory = Factory::with_seed(spec(), 3, Overrides::new()).unwrap();
        let first = factory.next_record().unwrap();
        factory.reseed(3);
        assert_eq!(factory.next_record().unwrap(), first);
    }

    #[test]
    fn test_missing_field_omitted() {
        let mut factory = Factory::with_seed(spec(), 1, Overrides::new()).unwrap();
        let record = factory.build(&Overrides::new().set("nick", "forced")).unwrap();
        assert!(record.get("nick").is_none());
    }

    #[test]
    fn test_dynamic_keys_stop_when_exhausted() {
        let mut factory = Factory::with_seed(spec(), 5, Overrides::new()).unwrap();
        let record = factory.next_record().unwrap();
        let labels = record["labels"].as_object().unwrap();
        assert!(!labels.is_empty());
        assert!(labels.len() <= 2);
    }

    #[test]
    fn test_generate_and_transform() {
        let mut factory = Factory::with_seed(spec(), 9, Overrides::new()).unwrap();
        let overrides = Overrides::new()
            .generate("items__0__name", || "first")
            .transform("id", |value| -value.as_i64().unwrap_or(0));
        let record = factory.build(&overrides).unwrap();

        assert_eq!(record["items"][0]["name"], "first");
        assert_eq!(record["items"][1]["name"], "n");
        assert!(record["id"].as_i64().unwrap() < 0);
    }

    #[test]
    fn test_failing_callable_propagates() {
        let mut factory = Factory::with_seed(spec(), 9, Overrides::new()).unwrap();
        let overrides =
            Overrides::new().try_transform("role", |_| Err::<Value, _>("no roles today"));
        match factory.build(&overrides) {
            Err(FactoryError::Override { path, source }) => {
                assert_eq!(path, "role");
                assert_eq!(source.to_string(), "no roles today");
            }
            other => panic!("Expected override error, got {:?}", other),
        }
    }

    #[test]
    fn test_copy_layers_overrides() {
        let mut base = Factory::with_seed(spec(), 2, Overrides::new().set("role", "user")).unwrap();
        let mut admin = base.copy(Overrides::new().set("items__name", "z")).unwrap();

        let record = admin.next_record().unwrap();
        assert_eq!(record["role"], "user");
        assert_eq!(record["items"][2]["name"], "z");
        assert!(admin.copy(Overrides::new().set("bogus", 1)).is_err());
    }

    #[test]
    fn test_batch_and_iter() {
        let mut factory = Factory::with_seed(spec(), 4, Overrides::new()).unwrap();
        let batch = factory.build_batch(10, &Overrides::new()).unwrap();
        assert_eq!(batch.len(), 10);
        let streamed: Vec<Value> = factory.iter().take(3).collect::<Result<_, _>>().unwrap();
        assert_eq!(streamed.len(), 3);
    }

    #[test]
    fn test_invalid_override_rejected_at_construction() {
        let result = Factory::new(spec(), Overrides::new().set("nonexistent__x", "y"));
        assert!(matches!(result, Err(FactoryError::OverridePath { .. })));
    }
}
