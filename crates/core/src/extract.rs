//! Flattening of nested sample records into per-path observations
//!
//! Every value in every record is recorded under its normalized
//! [`FieldPath`], together with the array indices that lead to it. The
//! indices let the spec builder slice one array position out of a path's
//! population when it models positional (fixed-length) arrays.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::path::FieldPath;

/// A scalar JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Convert a JSON value into a scalar, if it is one
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Scalar::Int(i)),
                None => n.as_f64().map(Scalar::Float),
            },
            Value::String(s) => Some(Scalar::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::Str(s) => Value::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Scalar::Int(_) | Scalar::Float(_))
    }

    /// Coarse type family; integers and floats share one
    pub fn family(&self) -> ScalarFamily {
        match self {
            Scalar::Bool(_) => ScalarFamily::Bool,
            Scalar::Int(_) | Scalar::Float(_) => ScalarFamily::Number,
            Scalar::Str(_) => ScalarFamily::String,
        }
    }

    /// Text rendering used for length statistics
    pub fn render(&self) -> String {
        match self {
            Scalar::Str(s) => s.clone(),
            other => other.to_value().to_string(),
        }
    }
}

/// Scalar type family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScalarFamily {
    Bool,
    Number,
    String,
}

/// What was seen at a path in one record
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Null,
    Scalar(Scalar),
    Array { len: usize },
    Object { keys: Vec<String> },
}

impl Observed {
    pub fn is_null(&self) -> bool {
        matches!(self, Observed::Null)
    }
}

/// One observed value plus the array positions leading to it
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub value: Observed,
    /// One entry per `[]` segment in the field path, outermost first
    pub indices: Vec<usize>,
}

impl Observation {
    /// Whether this observation lies at the given positions
    ///
    /// `filter` holds `(array depth, index)` pairs; depths beyond this
    /// observation's own nesting do not constrain it.
    pub fn matches(&self, filter: &[(usize, usize)]) -> bool {
        filter
            .iter()
            .all(|(depth, index)| self.indices.get(*depth).is_none_or(|i| i == index))
    }
}

/// Flattened view of a set of sample records
#[derive(Debug, Clone, Default)]
pub struct ExtractedData {
    /// Records that were flattened
    pub record_count: usize,
    /// Records skipped for exceeding the depth limit
    pub records_skipped: usize,
    /// Total observations recorded, root objects excluded
    pub data_points: usize,
    /// Observations per normalized path
    pub paths: BTreeMap<FieldPath, Vec<Observation>>,
}

impl ExtractedData {
    /// Flatten `records`, treating objects at `dynamic_paths` as dynamic-key
    /// mappings whose values collapse under `{}`
    pub fn extract<'r, I>(records: I, dynamic_paths: &BTreeSet<FieldPath>, max_depth: usize) -> Self
    where
        I: IntoIterator<Item = &'r Value>,
    {
        let mut data = Self::default();
        for record in records {
            let depth = value_depth(record);
            if depth > max_depth {
                warn!(depth, max_depth, "Skipping record nested beyond the depth limit");
                data.records_skipped += 1;
                continue;
            }
            data.record_count += 1;
            data.visit(FieldPath::root(), record, &[], dynamic_paths);
        }
        // The root observation of each record is bookkeeping, not data
        data.data_points -= data.record_count;
        debug!(
            records = data.record_count,
            paths = data.paths.len(),
            data_points = data.data_points,
            "Flattened sample records"
        );
        data
    }

    /// Observations at `path` that lie at the positions in `filter`
    pub fn observations(&self, path: &FieldPath, filter: &[(usize, usize)]) -> Vec<&Observation> {
        self.paths
            .get(path)
            .map(|obs| obs.iter().filter(|o| o.matches(filter)).collect())
            .unwrap_or_default()
    }

    /// Direct keyed children of `path`, in path order
    pub fn child_paths<'a>(&'a self, path: &'a FieldPath) -> impl Iterator<Item = &'a FieldPath> + 'a {
        self.paths
            .range(path.clone()..)
            .map(|(p, _)| p)
            .take_while(move |p| p.starts_with(path))
            .filter(move |p| p.is_child_of(path))
    }

    /// Paths at which at least one object was observed
    pub fn object_paths(&self) -> impl Iterator<Item = (&FieldPath, &Vec<Observation>)> {
        self.paths.iter().filter(|(_, obs)| {
            obs.iter()
                .any(|o| matches!(o.value, Observed::Object { .. }))
        })
    }

    fn visit(
        &mut self,
        path: FieldPath,
        value: &Value,
        indices: &[usize],
        dynamic_paths: &BTreeSet<FieldPath>,
    ) {
        self.data_points += 1;
        let observed = match value {
            Value::Null => Observed::Null,
            Value::Array(items) => {
                let item_path = path.item();
                for (i, item) in items.iter().enumerate() {
                    let mut item_indices = indices.to_vec();
                    item_indices.push(i);
                    self.visit(item_path.clone(), item, &item_indices, dynamic_paths);
                }
                Observed::Array { len: items.len() }
            }
            Value::Object(map) => {
                if dynamic_paths.contains(&path) {
                    let entry_path = path.entry();
                    for child in map.values() {
                        self.visit(entry_path.clone(), child, indices, dynamic_paths);
                    }
                } else {
                    for (key, child) in map {
                        self.visit(path.child(key), child, indices, dynamic_paths);
                    }
                }
                Observed::Object {
                    keys: map.keys().cloned().collect(),
                }
            }
            scalar => match Scalar::from_value(scalar) {
                Some(s) => Observed::Scalar(s),
                None => Observed::Null,
            },
        };
        self.paths.entry(path).or_default().push(Observation {
            value: observed,
            indices: indices.to_vec(),
        });
    }
}

/// Nesting depth of a JSON value; scalars have depth 0
pub fn value_depth(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(value_depth).max().unwrap_or(0),
        Value::Object(map) => 1 + map.values().map(value_depth).max().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(keys: &[&str]) -> FieldPath {
        let mut p = FieldPath::root();
        for key in keys {
            p = match *key {
                "[]" => p.item(),
                "{}" => p.entry(),
                k => p.child(k),
            };
        }
        p
    }

    #[test]
    fn test_extract_nested_paths() {
        let records = vec![
            json!({"id": 1, "user": {"name": "a"}, "tags": ["x", "y"]}),
            json!({"id": 2, "user": null, "tags": []}),
        ];
        let data = ExtractedData::extract(&records, &BTreeSet::new(), 32);

        assert_eq!(data.record_count, 2);
        assert_eq!(data.paths[&path(&["id"])].len(), 2);
        assert_eq!(data.paths[&path(&["user", "name"])].len(), 1);
        assert_eq!(data.paths[&path(&["tags", "[]"])].len(), 2);

        let user = &data.paths[&path(&["user"])];
        assert!(user.iter().any(|o| o.value.is_null()));
    }

    #[test]
    fn test_item_indices_recorded() {
        let records = vec![json!({"pair": [[1, 2], [3]]})];
        let data = ExtractedData::extract(&records, &BTreeSet::new(), 32);

        let inner = &data.paths[&path(&["pair", "[]", "[]"])];
        let indices: Vec<_> = inner.iter().map(|o| o.indices.clone()).collect();
        assert_eq!(indices, vec![vec![0, 0], vec![0, 1], vec![1, 0]]);

        let second_slot = data.observations(&path(&["pair", "[]", "[]"]), &[(1, 1)]);
        assert_eq!(second_slot.len(), 1);
        assert_eq!(second_slot[0].value, Observed::Scalar(Scalar::Int(2)));
    }

    #[test]
    fn test_dynamic_paths_collapse() {
        let records = vec![json!({"scores": {"alice": 3, "bob": 5}})];
        let dynamic: BTreeSet<_> = [path(&["scores"])].into_iter().collect();
        let data = ExtractedData::extract(&records, &dynamic, 32);

        assert_eq!(data.paths[&path(&["scores", "{}"])].len(), 2);
        assert!(!data.paths.contains_key(&path(&["scores", "alice"])));
        match &data.paths[&path(&["scores"])][0].value {
            Observed::Object { keys } => assert_eq!(keys.len(), 2),
            other => panic!("Expected object observation, got {:?}", other),
        }
    }

    #[test]
    fn test_max_depth_skips_record() {
        let records = vec![json!({"a": {"b": {"c": 1}}}), json!({"a": 1})];
        let data = ExtractedData::extract(&records, &BTreeSet::new(), 2);

        assert_eq!(data.record_count, 1);
        assert_eq!(data.records_skipped, 1);
    }

    #[test]
    fn test_child_paths() {
        let records = vec![json!({"a": {"b": 1, "c": [1]}, "d": 2})];
        let data = ExtractedData::extract(&records, &BTreeSet::new(), 32);

        let children: Vec<_> = data.child_paths(&path(&["a"])).cloned().collect();
        assert_eq!(children, vec![path(&["a", "b"]), path(&["a", "c"])]);

        let top: Vec<_> = data.child_paths(&FieldPath::root()).cloned().collect();
        assert_eq!(top, vec![path(&["a"]), path(&["d"])]);
    }

    #[test]
    fn test_data_points_exclude_root() {
        let records = vec![json!({"a": 1, "b": [1, 2]})];
        let data = ExtractedData::extract(&records, &BTreeSet::new(), 32);
        // a, b, b[0], b[1]
        assert_eq!(data.data_points, 4);
    }
}
