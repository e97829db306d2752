//! Spec building from sample records

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use super::{Presence, SPEC_VERSION, Shape, Spec, SpecMetadata, SpecNode};
use crate::analysis::number::fit_number;
use crate::analysis::presence::analyze_presence;
use crate::analysis::shape::{fixed_array_length, is_dynamic_mapping, observed_type};
use crate::analysis::{AnalysisConfig, AnalysisError, Analyzers};
use crate::extract::{ExtractedData, Observation, Observed, Scalar};
use crate::hints::Hint;
use crate::path::{FieldPath, Segment};
use crate::schema::RecordModel;

/// Statistics from spec building
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    /// Records that were analyzed
    pub records_processed: usize,
    /// Records skipped (invalid JSON, non-object root, too deep)
    pub records_skipped: usize,
    /// Distinct field paths discovered
    pub fields_discovered: usize,
    /// Values observed, record roots excluded
    pub data_points: usize,
    /// Values that ended up in no analyzer's population
    pub unclassifiable: usize,
    /// Object paths modelled as dynamic-key mappings
    pub dynamic_paths: Vec<String>,
    /// Selected analyzer by path; `fallback` when none fit
    pub selected: BTreeMap<String, String>,
    /// Choice fields with many distinct values
    pub high_cardinality: Vec<String>,
}

/// Spec builder
///
/// Collects sample records and turns them into a [`Spec`]. Malformed input
/// is skipped and counted, never fatal.
pub struct SpecBuilder {
    config: AnalysisConfig,
    analyzers: Analyzers,
    model: Option<Box<dyn RecordModel>>,
    records: Vec<Value>,
    skipped_count: usize,
}

impl Default for SpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecBuilder {
    /// Create a new spec builder with default configuration
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    /// Create a new spec builder with custom configuration
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            analyzers: Analyzers::new(&config),
            config,
            model: None,
            records: Vec::new(),
            skipped_count: 0,
        }
    }

    /// Consult `model` to decide which objects are dynamic-key mappings
    ///
    /// With a model the key-statistics heuristic is not used at all.
    pub fn with_record_model(mut self, model: impl RecordModel + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    fn is_full(&self) -> bool {
        self.config.sample_size > 0 && self.records.len() >= self.config.sample_size
    }

    /// Add a single JSON record; invalid JSON is skipped
    pub fn add_json(&mut self, json: &str) {
        if self.is_full() {
            return;
        }
        match serde_json::from_str::<Value>(json) {
            Ok(value) => self.add_value(value),
            Err(e) => {
                debug!(error = %e, "Skipping unparsable record");
                self.skipped_count += 1;
            }
        }
    }

    /// Add a parsed record; records whose root is not an object are skipped
    pub fn add_value(&mut self, value: Value) {
        if self.is_full() {
            return;
        }
        if !value.is_object() {
            warn!(found = value_type_name(&value), "Skipping record without an object root");
            self.skipped_count += 1;
            return;
        }
        self.records.push(value);
    }

    /// Add every record of an iterator
    pub fn add_records(&mut self, records: impl IntoIterator<Item = Value>) {
        for record in records {
            self.add_value(record);
        }
    }

    /// Add sample text: a JSON array of records, one record, or JSON Lines
    pub fn add_text(&mut self, text: &str) -> Result<(), AnalysisError> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(records)) => self.add_records(records),
            Ok(record @ Value::Object(_)) => self.add_value(record),
            Ok(other) => {
                return Err(AnalysisError::InvalidStructure(
                    value_type_name(&other).to_string(),
                ));
            }
            Err(_) => {
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    self.add_json(line);
                }
            }
        }
        Ok(())
    }

    /// Records collected so far
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Collection statistics; analysis counts are filled in by
    /// [`finalize_with_stats`](Self::finalize_with_stats)
    pub fn stats(&self) -> AnalysisStats {
        AnalysisStats {
            records_processed: self.records.len(),
            records_skipped: self.skipped_count,
            ..AnalysisStats::default()
        }
    }

    /// Build the spec
    pub fn finalize(self) -> Result<Spec, AnalysisError> {
        self.finalize_with_stats().map(|(spec, _)| spec)
    }

    /// Build the spec and report what the analysis found
    pub fn finalize_with_stats(self) -> Result<(Spec, AnalysisStats), AnalysisError> {
        let _span = info_span!("build_spec", records = self.records.len()).entered();
        if self.records.is_empty() {
            return Err(AnalysisError::NoRecords);
        }

        let (dynamic, data) = self.detect_dynamic_paths();
        if data.record_count == 0 {
            return Err(AnalysisError::NoRecords);
        }

        let mut run = BuildRun {
            config: &self.config,
            analyzers: &self.analyzers,
            data: &data,
            dynamic: &dynamic,
            stats: AnalysisStats {
                records_processed: data.record_count,
                records_skipped: self.skipped_count + data.records_skipped,
                fields_discovered: data.paths.len().saturating_sub(1),
                data_points: data.data_points,
                dynamic_paths: dynamic.iter().map(ToString::to_string).collect(),
                ..AnalysisStats::default()
            },
        };

        let root = run
            .build_node(&FieldPath::root(), &[], None)
            .filter(|node| matches!(node.shape, Shape::Object { .. }))
            .ok_or_else(|| AnalysisError::InvalidStructure("no object records".to_string()))?
            .with_presence(Presence::always());
        let stats = run.stats;

        info!(
            records = stats.records_processed,
            skipped = stats.records_skipped,
            fields = stats.fields_discovered,
            unclassifiable = stats.unclassifiable,
            "Built spec"
        );

        let spec = Spec {
            metadata: SpecMetadata {
                samples_analyzed: stats.records_processed,
                data_points: stats.data_points,
                unclassifiable: stats.unclassifiable,
                version: SPEC_VERSION,
            },
            root,
        };
        Ok((spec, stats))
    }

    /// Find dynamic-key objects, re-flattening until nothing changes
    ///
    /// Collapsing one mapping can expose another below it, since its values
    /// only form one population after the collapse.
    fn detect_dynamic_paths(&self) -> (BTreeSet<FieldPath>, ExtractedData) {
        let mut dynamic = BTreeSet::new();
        loop {
            let data = ExtractedData::extract(&self.records, &dynamic, self.config.max_depth);
            let found: Vec<FieldPath> = data
                .object_paths()
                .filter(|(path, _)| !path.is_root() && !dynamic.contains(*path))
                .filter(|(path, observations)| self.is_dynamic(path, observations))
                .map(|(path, _)| path.clone())
                .collect();
            if found.is_empty() {
                return (dynamic, data);
            }
            for path in found {
                debug!(path = %path, "Treating object as dynamic-key mapping");
                dynamic.insert(path);
            }
        }
    }

    fn is_dynamic(&self, path: &FieldPath, observations: &[Observation]) -> bool {
        if let Some(model) = &self.model {
            return model.is_open_mapping(&path.dotted_keys());
        }
        let key_sets: Vec<&[String]> = observations
            .iter()
            .filter_map(|o| match &o.value {
                Observed::Object { keys } => Some(keys.as_slice()),
                _ => None,
            })
            .collect();
        is_dynamic_mapping(
            &key_sets,
            self.config.dynamic_key_min_distinct,
            self.config.dynamic_key_max_recurrence,
        )
    }
}

/// Build a spec from already-parsed records
pub fn create_spec(records: &[Value], config: AnalysisConfig) -> Result<Spec, AnalysisError> {
    let mut builder = SpecBuilder::with_config(config);
    builder.add_records(records.iter().cloned());
    builder.finalize()
}

/// State of one spec-building pass
struct BuildRun<'a> {
    config: &'a AnalysisConfig,
    analyzers: &'a Analyzers,
    data: &'a ExtractedData,
    dynamic: &'a BTreeSet<FieldPath>,
    stats: AnalysisStats,
}

impl BuildRun<'_> {
    /// Node for the observations at `path` lying at the positions in `filter`
    ///
    /// `parent_present` is the number of parent objects the field could have
    /// appeared in, or `None` for array elements and mapping values.
    fn build_node(
        &mut self,
        path: &FieldPath,
        filter: &[(usize, usize)],
        parent_present: Option<usize>,
    ) -> Option<SpecNode> {
        let observations = self.data.observations(path, filter);
        if observations.is_empty() {
            return None;
        }
        let presence = analyze_presence(&observations, parent_present);

        let values: Vec<&Observed> = observations
            .iter()
            .map(|o| &o.value)
            .filter(|v| !v.is_null())
            .collect();
        if values.is_empty() {
            return Some(SpecNode::null().with_presence(Presence {
                missing: presence.missing,
                null: 1.0,
            }));
        }

        let mut type_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for value in &values {
            *type_counts.entry(observed_type(value)).or_default() += 1;
        }
        // Most frequent type wins; ties go to the alphabetically first name
        let (majority, count) = type_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(name, count)| (*name, *count))?;
        let minority = values.len() - count;
        if minority > 0 {
            warn!(
                path = %label(path, filter),
                excluded = minority,
                kept = majority,
                "Excluding values of a minority type"
            );
            self.stats.unclassifiable += minority;
        }
        let typed: Vec<&Observed> = values
            .into_iter()
            .filter(|v| observed_type(v) == majority)
            .collect();

        let shape = match majority {
            "object" if self.dynamic.contains(path) => self.dynamic_shape(path, filter, &typed),
            "object" => self.object_shape(path, filter, typed.len()),
            "array" => self.array_shape(path, filter, &typed),
            _ => self.value_shape(path, filter, &typed),
        };
        Some(SpecNode { presence, shape })
    }

    fn object_shape(&mut self, path: &FieldPath, filter: &[(usize, usize)], objects: usize) -> Shape {
        let children: Vec<(String, FieldPath)> = self
            .data
            .child_paths(path)
            .filter_map(|child| match child.last() {
                Some(Segment::Key(key)) => Some((key.clone(), child.clone())),
                _ => None,
            })
            .collect();

        let mut fields = BTreeMap::new();
        for (key, child) in children {
            if let Some(node) = self.build_node(&child, filter, Some(objects)) {
                fields.insert(key, node);
            }
        }
        Shape::Object { fields }
    }

    fn array_shape(&mut self, path: &FieldPath, filter: &[(usize, usize)], arrays: &[&Observed]) -> Shape {
        let lengths: Vec<usize> = arrays
            .iter()
            .filter_map(|v| match v {
                Observed::Array { len } => Some(*len),
                _ => None,
            })
            .collect();
        let item_path = path.item();
        let depth = path.item_depth();
        let elements = self.data.observations(&item_path, filter);

        if let Some(length) =
            fixed_array_length(&lengths, &elements, depth, self.config.max_fixed_array_len)
        {
            debug!(path = %label(path, filter), length, "Positional array");
            let elements = (0..length)
                .map(|index| {
                    let mut positioned = filter.to_vec();
                    positioned.push((depth, index));
                    self.build_node(&item_path, &positioned, None)
                        .unwrap_or_else(SpecNode::null)
                })
                .collect();
            return Shape::Fixed { length, elements };
        }

        let as_f64: Vec<f64> = lengths.iter().map(|l| *l as f64).collect();
        let length = fit_number(&as_f64, true, self.config.outlier_rate_cap);
        let element = self
            .build_node(&item_path, filter, None)
            .unwrap_or_else(SpecNode::null);
        Shape::Variable {
            length,
            element: Box::new(element),
        }
    }

    fn dynamic_shape(&mut self, path: &FieldPath, filter: &[(usize, usize)], objects: &[&Observed]) -> Shape {
        let mut counts = Vec::with_capacity(objects.len());
        let mut keys = Vec::new();
        for object in objects {
            if let Observed::Object { keys: object_keys } = object {
                counts.push(object_keys.len() as f64);
                keys.extend(object_keys.iter().map(|k| Scalar::Str(k.clone())));
            }
        }
        let count = fit_number(&counts, true, self.config.outlier_rate_cap);

        // Keys are not data points, so a key fallback is not unclassifiable
        let key = self.analyzers.select(&keys);
        self.stats.selected.insert(
            format!("{} keys", label(path, filter)),
            selection_name(key.kind),
        );

        let value = self
            .build_node(&path.entry(), filter, None)
            .unwrap_or_else(SpecNode::null);
        Shape::DynamicKeys {
            count,
            key: key.hint,
            value: Box::new(value),
        }
    }

    fn value_shape(&mut self, path: &FieldPath, filter: &[(usize, usize)], values: &[&Observed]) -> Shape {
        let scalars: Vec<Scalar> = values
            .iter()
            .filter_map(|v| match v {
                Observed::Scalar(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        let name = label(path, filter);
        let selection = self.analyzers.select(&scalars);

        if selection.is_fallback() && !selection.suppressed {
            warn!(path = %name, values = scalars.len(), "No analyzer matched; using text fallback");
            self.stats.unclassifiable += scalars.len();
        }
        if let Hint::Choice(params) = &selection.hint {
            if params.choices.len() > self.config.max_choices / 2 {
                warn!(
                    path = %name,
                    choices = params.choices.len(),
                    "High-cardinality choice field"
                );
                self.stats.high_cardinality.push(name.clone());
            }
        }
        debug!(
            path = %name,
            analyzer = %selection_name(selection.kind),
            confidence = selection.confidence,
            "Selected hint"
        );
        self.stats.selected.insert(name, selection_name(selection.kind));
        Shape::Value {
            hint: selection.hint,
        }
    }
}

fn selection_name(kind: Option<crate::analysis::AnalyzerKind>) -> String {
    kind.map(|k| k.to_string())
        .unwrap_or_else(|| "fallback".to_string())
}

/// Path text with the positions from `filter` filled in, e.g. `pair[1]`
fn label(path: &FieldPath, filter: &[(usize, usize)]) -> String {
    if path.is_root() {
        return "$".to_string();
    }
    let mut out = String::new();
    let mut depth = 0;
    for segment in path.segments() {
        match segment {
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Item => {
                match filter.iter().find(|(d, _)| *d == depth) {
                    Some((_, index)) => out.push_str(&format!("[{}]", index)),
                    None => out.push_str("[]"),
                }
                depth += 1;
            }
            Segment::Entry => out.push_str("{}"),
        }
    }
    out
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
