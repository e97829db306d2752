//! Overrides: caller-supplied values and transforms for record paths
//!
//! Keys use `__` (or `.`) between segments. A numeric segment selects one
//! array element; leaving the index out applies the override to every
//! element, so `items__name` reaches `items[0].name`, `items[1].name` and so
//! on, while `items__1__name` reaches only the second element.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::error::{BoxError, FactoryError};
use crate::path::{PathSegment, RecordPath};
use crate::spec::{Shape, Spec, SpecNode};

type GenerateFn = dyn Fn() -> Result<Value, BoxError> + Send + Sync;
type TransformFn = dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync;
type ContextFn = dyn Fn(Value, &Value) -> Result<Value, BoxError> + Send + Sync;

/// What an override does to the value at its path
#[derive(Clone)]
pub enum Override {
    /// Use this value instead of generating one
    ///
    /// Overrides on paths inside the value are applied to it afterwards.
    Literal(Value),
    /// Call a function instead of generating
    Generate(Arc<GenerateFn>),
    /// Generate, then pass the value through a function
    Transform(Arc<TransformFn>),
    /// Generate, then pass the value and the finished record to a function
    ///
    /// Runs once the rest of the record exists, in traversal order.
    WithContext(Arc<ContextFn>),
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Override::Generate(_) => f.write_str("Generate(..)"),
            Override::Transform(_) => f.write_str("Transform(..)"),
            Override::WithContext(_) => f.write_str("WithContext(..)"),
        }
    }
}

/// A set of overrides keyed by override path
///
/// Setting a key twice keeps the later override.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    entries: Vec<(String, Override)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed value
    pub fn set(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(key, Override::Literal(value.into()))
    }

    /// Value produced by `f` instead of the hint
    pub fn generate<F, T>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<Value>,
    {
        let generate: Arc<GenerateFn> =
            Arc::new(move || -> Result<Value, BoxError> { Ok(f().into()) });
        self.with(key, Override::Generate(generate))
    }

    /// Generated value passed through `f`
    pub fn transform<F, T>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> T + Send + Sync + 'static,
        T: Into<Value>,
    {
        let transform: Arc<TransformFn> =
            Arc::new(move |value: Value| -> Result<Value, BoxError> { Ok(f(value).into()) });
        self.with(key, Override::Transform(transform))
    }

    /// Generated value passed through `f` along with the whole record
    pub fn with_context<F, T>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, &Value) -> T + Send + Sync + 'static,
        T: Into<Value>,
    {
        let context: Arc<ContextFn> =
            Arc::new(move |value: Value, record: &Value| -> Result<Value, BoxError> {
                Ok(f(value, record).into())
            });
        self.with(key, Override::WithContext(context))
    }

    /// Fallible [`transform`](Self::transform); errors abort the build
    pub fn try_transform<F, E>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let transform: Arc<TransformFn> =
            Arc::new(move |value: Value| -> Result<Value, BoxError> { f(value).map_err(Into::into) });
        self.with(key, Override::Transform(transform))
    }

    /// Fallible [`with_context`](Self::with_context); errors abort the build
    pub fn try_with_context<F, E>(self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value, &Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let context: Arc<ContextFn> =
            Arc::new(move |value: Value, record: &Value| -> Result<Value, BoxError> {
                f(value, record).map_err(Into::into)
            });
        self.with(key, Override::WithContext(context))
    }

    fn with(mut self, key: impl Into<String>, value: Override) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Override) {
        let key = key.into();
        self.entries.retain(|(existing, _)| *existing != key);
        self.entries.push((key, value));
    }

    /// These overrides with `other`'s layered on top
    pub fn merged(&self, other: &Overrides) -> Overrides {
        let mut merged = self.clone();
        for (key, value) in &other.entries {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Override)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Parse every key and check that it addresses a node of `spec`
    pub(crate) fn compile(&self, spec: &Spec) -> Result<Vec<Compiled>, FactoryError> {
        self.entries
            .iter()
            .map(|(key, value)| {
                let path = RecordPath::parse_key(key).ok_or_else(|| FactoryError::OverridePath {
                    key: key.clone(),
                    reason: "empty key or path segment".to_string(),
                })?;
                resolve(&spec.root, path.segments()).map_err(|reason| {
                    FactoryError::OverridePath {
                        key: key.clone(),
                        reason,
                    }
                })?;
                Ok(Compiled {
                    path,
                    value: value.clone(),
                })
            })
            .collect()
    }
}

/// An override whose key was checked against a spec
#[derive(Debug, Clone)]
pub(crate) struct Compiled {
    pub path: RecordPath,
    pub value: Override,
}

impl Compiled {
    pub fn applies_to(&self, concrete: &RecordPath) -> bool {
        matches_path(self.path.segments(), concrete.segments())
    }
}

/// An override chosen for a concrete path
pub(crate) struct Matched<'o> {
    pub value: &'o Override,
    level: usize,
    position: usize,
}

impl Matched<'_> {
    /// Overrides that still reach below a literal set by this match
    ///
    /// Those are the later entries of the same level and every entry of a
    /// higher-precedence level.
    pub fn scope_below<'l>(&self, levels: [&'l [Compiled]; 2]) -> [&'l [Compiled]; 2] {
        let mut scoped = levels;
        scoped[self.level] = &levels[self.level][self.position + 1..];
        for lower in scoped.iter_mut().skip(self.level + 1) {
            *lower = &[];
        }
        scoped
    }
}

/// Best override for a concrete path
///
/// Call-level overrides beat constructor-level ones; within a level more
/// explicit indices win, then the later entry.
pub(crate) fn lookup<'o>(levels: [&'o [Compiled]; 2], concrete: &RecordPath) -> Option<Matched<'o>> {
    levels.into_iter().enumerate().find_map(|(level, entries)| {
        entries
            .iter()
            .enumerate()
            .filter(|(_, compiled)| compiled.applies_to(concrete))
            .max_by_key(|(position, compiled)| (compiled.path.index_count(), *position))
            .map(|(position, compiled)| Matched {
                value: &compiled.value,
                level,
                position,
            })
    })
}

/// Whether `pattern` addresses `concrete`, skipping array positions the
/// pattern leaves out
///
/// Only a key segment may skip array positions, so an index in the pattern
/// always names the first array level below the segment before it.
fn matches_path(pattern: &[PathSegment], concrete: &[PathSegment]) -> bool {
    match (pattern.split_first(), concrete.split_first()) {
        (None, None) => true,
        (Some((p, p_rest)), Some((c, c_rest))) => {
            (segment_matches(p, c) && matches_path(p_rest, c_rest))
                || (matches!(p, PathSegment::Key(_))
                    && matches!(c, PathSegment::Index(_))
                    && matches_path(pattern, c_rest))
        }
        _ => false,
    }
}

fn segment_matches(pattern: &PathSegment, concrete: &PathSegment) -> bool {
    match (pattern, concrete) {
        (PathSegment::Index(i), PathSegment::Key(key)) => *key == i.to_string(),
        _ => pattern == concrete,
    }
}

/// Walk `segments` down the spec tree
fn resolve(node: &SpecNode, segments: &[PathSegment]) -> Result<(), String> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(());
    };
    match (&node.shape, head) {
        (Shape::Object { fields }, PathSegment::Key(key)) => match fields.get(key) {
            Some(child) => resolve(child, rest),
            None => Err(format!("no field `{}`", key)),
        },
        (Shape::Object { fields }, PathSegment::Index(index)) => {
            match fields.get(&index.to_string()) {
                Some(child) => resolve(child, rest),
                None => Err(format!("no field `{}`", index)),
            }
        }
        (Shape::DynamicKeys { value, .. }, _) => resolve(value, rest),
        (Shape::Fixed { elements, .. }, PathSegment::Index(index)) => match elements.get(*index) {
            Some(element) => resolve(element, rest),
            None => Err(format!(
                "index {} beyond fixed array length {}",
                index,
                elements.len()
            )),
        },
        (Shape::Fixed { elements, .. }, PathSegment::Key(_)) => {
            let mut last = Err("empty array".to_string());
            for element in elements {
                last = resolve(element, segments);
                if last.is_ok() {
                    break;
                }
            }
            last
        }
        (Shape::Variable { element, .. }, PathSegment::Index(_)) => resolve(element, rest),
        (Shape::Variable { element, .. }, PathSegment::Key(_)) => resolve(element, segments),
        (Shape::Value { .. }, _) => Err(format!("`{}` is below a scalar value", head_text(head))),
    }
}

fn head_text(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Key(key) => key.clone(),
        PathSegment::Index(index) => index.to_string(),
    }
}
