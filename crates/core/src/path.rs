//! Field paths for sample analysis and record paths for generation
//!
//! A [`FieldPath`] addresses a *population* of values across many records:
//! array positions collapse to `[]` and dynamic-key object entries collapse
//! to `{}`. A [`RecordPath`] addresses one concrete location inside a single
//! generated record and is what override keys are parsed into.

use std::fmt;

use serde_json::Value;

/// One segment of a normalized field path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Object key
    Key(String),
    /// Any array element
    Item,
    /// Any value of a dynamic-key object
    Entry,
}

/// Normalized address of a field across sample records
///
/// Ordering is lexicographic over segments, so every descendant of a path
/// sorts directly after it. The spec builder relies on that to find children
/// with a range scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// The record root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.last()
    }

    /// Path of an object key below this path
    pub fn child(&self, key: &str) -> Self {
        self.with(Segment::Key(key.to_string()))
    }

    /// Path of the elements of an array at this path
    pub fn item(&self) -> Self {
        self.with(Segment::Item)
    }

    /// Path of the values of a dynamic-key object at this path
    pub fn entry(&self) -> Self {
        self.with(Segment::Entry)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Whether `self` is a direct child of `parent`
    pub fn is_child_of(&self, parent: &FieldPath) -> bool {
        self.0.len() == parent.0.len() + 1 && self.starts_with(parent)
    }

    /// Number of array wildcards in the path
    ///
    /// Equals the length of the index vector carried by observations at
    /// this path.
    pub fn item_depth(&self) -> usize {
        self.0.iter().filter(|s| matches!(s, Segment::Item)).count()
    }

    /// Whether the path addresses array elements or dynamic-key values
    pub fn is_wildcard(&self) -> bool {
        matches!(self.0.last(), Some(Segment::Item | Segment::Entry))
    }

    /// Dotted key-only form used to query a record model
    ///
    /// Array wildcards are dropped and dynamic-key wildcards render as `*`,
    /// so `orders[].labels{}.name` becomes `orders.labels.*.name`.
    pub fn dotted_keys(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => parts.push(key),
                Segment::Entry => parts.push("*"),
                Segment::Item => {}
            }
        }
        parts.join(".")
    }

    fn with(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        let mut first = true;
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", key)?;
                }
                Segment::Item => write!(f, "[]")?,
                Segment::Entry => write!(f, "{{}}")?,
            }
            first = false;
        }
        Ok(())
    }
}

/// One segment of a concrete record location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Concrete location inside one record, e.g. `items[1].name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RecordPath(Vec<PathSegment>);

impl RecordPath {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Parse an override key
    ///
    /// Segments are separated by `__` (or `.`); purely numeric segments are
    /// array indices unless they overflow `usize`, in which case they stay
    /// object keys. Returns `None` for empty keys or empty segments.
    pub fn parse_key(key: &str) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        let normalized = key.replace("__", ".");
        let mut segments = Vec::new();
        for part in normalized.split('.') {
            if part.is_empty() {
                return None;
            }
            let segment = match part.parse::<usize>() {
                Ok(index) if part.bytes().all(|b| b.is_ascii_digit()) => PathSegment::Index(index),
                _ => PathSegment::Key(part.to_string()),
            };
            segments.push(segment);
        }
        Some(Self(segments))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of explicit array indices
    pub fn index_count(&self) -> usize {
        self.0
            .iter()
            .filter(|s| matches!(s, PathSegment::Index(_)))
            .count()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    /// Look up the value at this path inside `record`
    pub fn get<'v>(&self, record: &'v Value) -> Option<&'v Value> {
        let mut current = record;
        for segment in &self.0 {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
                (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable lookup of the value at this path inside `record`
    pub fn get_mut<'v>(&self, record: &'v mut Value) -> Option<&'v mut Value> {
        let mut current = record;
        for segment in &self.0 {
            current = match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get_mut(key)?,
                (PathSegment::Index(index), Value::Array(items)) => items.get_mut(*index)?,
                (PathSegment::Index(index), Value::Object(map)) => {
                    map.get_mut(&index.to_string())?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

impl fmt::Display for RecordPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
