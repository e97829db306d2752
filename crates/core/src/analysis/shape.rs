//! Array and object shape decisions

use std::collections::{BTreeMap, BTreeSet};

use crate::extract::{Observation, Observed, Scalar};

/// Coarse type name of an observed value
pub fn observed_type(value: &Observed) -> &'static str {
    match value {
        Observed::Null => "null",
        Observed::Scalar(Scalar::Bool(_)) => "boolean",
        Observed::Scalar(Scalar::Int(_) | Scalar::Float(_)) => "number",
        Observed::Scalar(Scalar::Str(_)) => "string",
        Observed::Array { .. } => "array",
        Observed::Object { .. } => "object",
    }
}

/// Length of a positional array, if the arrays at a path are one
///
/// Every array must share one non-zero length of at most `max_len`, and
/// the element types must differ between at least two positions. `depth`
/// is the array's position in the element observations' index vectors.
pub fn fixed_array_length(
    lengths: &[usize],
    elements: &[&Observation],
    depth: usize,
    max_len: usize,
) -> Option<usize> {
    let len = *lengths.first()?;
    if len == 0 || len > max_len || lengths.iter().any(|l| *l != len) {
        return None;
    }
    let mut signatures: BTreeMap<usize, BTreeSet<&'static str>> = BTreeMap::new();
    for element in elements {
        if let Some(index) = element.indices.get(depth) {
            signatures
                .entry(*index)
                .or_default()
                .insert(observed_type(&element.value));
        }
    }
    let mut distinct = signatures.values();
    let first = distinct.next()?;
    if distinct.any(|s| s != first) {
        Some(len)
    } else {
        None
    }
}

/// Whether objects with these key sets form a dynamic-key mapping
///
/// Needs at least `min_distinct` distinct keys overall, and on average a
/// key may appear in no more than `max_recurrence` of the objects.
pub fn is_dynamic_mapping(key_sets: &[&[String]], min_distinct: usize, max_recurrence: f64) -> bool {
    if key_sets.is_empty() {
        return false;
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for keys in key_sets {
        for key in keys.iter() {
            *counts.entry(key.as_str()).or_default() += 1;
        }
    }
    if counts.len() < min_distinct.max(1) {
        return false;
    }
    let objects = key_sets.len() as f64;
    let mean_recurrence =
        counts.values().map(|c| *c as f64 / objects).sum::<f64>() / counts.len() as f64;
    mean_recurrence <= max_recurrence
}
