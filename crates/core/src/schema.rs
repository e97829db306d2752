//! Record models used to recognise dynamic-key mappings
//!
//! The spec builder only needs to know whether an object field is declared
//! as an open key/value mapping. Paths are dotted key paths with array
//! positions dropped and mapping values written as `*`, e.g.
//! `orders.labels.*.name`.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::analysis::AnalysisError;

/// Nesting limit while following `$ref`s and combinators
const MAX_SCHEMA_DEPTH: usize = 64;

/// Answers whether an object field is an open mapping
pub trait RecordModel {
    fn is_open_mapping(&self, path: &str) -> bool;
}

impl<F> RecordModel for F
where
    F: Fn(&str) -> bool,
{
    fn is_open_mapping(&self, path: &str) -> bool {
        self(path)
    }
}

/// An explicit list of mapping paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenMappings {
    paths: BTreeSet<String>,
}

impl OpenMappings {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl RecordModel for OpenMappings {
    fn is_open_mapping(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

/// Record model read from a JSON Schema document
///
/// An object schema is an open mapping when it declares no `properties`
/// but allows further keys through `additionalProperties` (a schema or
/// `true`) or `patternProperties`. Local `$ref`s into `$defs` or
/// `definitions` are followed; `items`, `prefixItems`, `anyOf`, `oneOf` and
/// `allOf` are searched.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaModel {
    mappings: OpenMappings,
}

impl JsonSchemaModel {
    pub fn from_value(schema: &Value) -> Result<Self, AnalysisError> {
        if !schema.is_object() {
            return Err(AnalysisError::RecordModel(
                "schema document must be an object".to_string(),
            ));
        }
        let mut walker = Walker {
            root: schema,
            expanding: Vec::new(),
            found: OpenMappings::default(),
        };
        walker.visit(schema, &[], 0)?;
        debug!(
            mappings = walker.found.paths.len(),
            "Read open mappings from JSON Schema"
        );
        Ok(Self {
            mappings: walker.found,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let schema: Value = serde_json::from_str(json)
            .map_err(|e| AnalysisError::RecordModel(e.to_string()))?;
        Self::from_value(&schema)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Paths the schema declares as open mappings
    pub fn mappings(&self) -> &OpenMappings {
        &self.mappings
    }
}

impl RecordModel for JsonSchemaModel {
    fn is_open_mapping(&self, path: &str) -> bool {
        self.mappings.is_open_mapping(path)
    }
}

struct Walker<'a> {
    root: &'a Value,
    /// `$ref`s currently being expanded; re-entering one would not terminate
    expanding: Vec<&'a str>,
    found: OpenMappings,
}

impl<'a> Walker<'a> {
    fn visit(&mut self, schema: &'a Value, prefix: &[String], depth: usize) -> Result<(), AnalysisError> {
        if depth > MAX_SCHEMA_DEPTH {
            return Err(AnalysisError::RecordModel(format!(
                "schema nesting exceeds {} levels at '{}'",
                MAX_SCHEMA_DEPTH,
                prefix.join(".")
            )));
        }
        let Some(obj) = schema.as_object() else {
            return Ok(());
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            if !self.expanding.contains(&reference) {
                let target = self.resolve(reference)?;
                self.expanding.push(reference);
                let visited = self.visit(target, prefix, depth + 1);
                self.expanding.pop();
                visited?;
            }
        }
        for combinator in ["anyOf", "oneOf", "allOf"] {
            if let Some(members) = obj.get(combinator).and_then(Value::as_array) {
                for member in members {
                    self.visit(member, prefix, depth + 1)?;
                }
            }
        }
        match obj.get("items") {
            Some(Value::Array(tuple)) => {
                for item in tuple {
                    self.visit(item, prefix, depth + 1)?;
                }
            }
            Some(item) => self.visit(item, prefix, depth + 1)?,
            None => {}
        }
        if let Some(tuple) = obj.get("prefixItems").and_then(Value::as_array) {
            for item in tuple {
                self.visit(item, prefix, depth + 1)?;
            }
        }

        let properties = obj.get("properties").and_then(Value::as_object);
        if let Some(properties) = properties {
            for (key, child) in properties {
                self.visit(child, &extend(prefix, key), depth + 1)?;
            }
        }

        if properties.is_none_or(|p| p.is_empty()) {
            let additional = obj
                .get("additionalProperties")
                .filter(|v| v.is_object() || v.as_bool() == Some(true));
            let patterns = obj
                .get("patternProperties")
                .and_then(Value::as_object)
                .filter(|p| !p.is_empty());
            if additional.is_some() || patterns.is_some() {
                self.found.insert(prefix.join("."));
                let entry = extend(prefix, "*");
                if let Some(value_schema) = additional {
                    self.visit(value_schema, &entry, depth + 1)?;
                }
                if let Some(patterns) = patterns {
                    for value_schema in patterns.values() {
                        self.visit(value_schema, &entry, depth + 1)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve(&self, reference: &str) -> Result<&'a Value, AnalysisError> {
        let name = reference
            .strip_prefix("#/$defs/")
            .map(|name| ("$defs", name))
            .or_else(|| {
                reference
                    .strip_prefix("#/definitions/")
                    .map(|name| ("definitions", name))
            });
        name.and_then(|(section, name)| self.root.get(section)?.get(name))
            .ok_or_else(|| AnalysisError::RecordModel(format!("unresolvable $ref '{}'", reference)))
    }
}

fn extend(prefix: &[String], key: &str) -> Vec<String> {
    let mut path = prefix.to_vec();
    path.push(key.to_string());
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_mappings() {
        let model = OpenMappings::new(["labels", "orders.meta"]);
        assert!(model.is_open_mapping("labels"));
        assert!(!model.is_open_mapping("orders"));
    }

    #[test]
    fn test_closure_model() {
        let model = |path: &str| path.ends_with("attrs");
        assert!(model.is_open_mapping("item.attrs"));
        assert!(!model.is_open_mapping("item"));
    }

    #[test]
    fn test_json_schema_mappings() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "labels": {
                    "type": "object",
                    "additionalProperties": {"type": "string"}
                },
                "orders": {
                    "type": "array",
                    "items": {"$ref": "#/$defs/Order"}
                },
                "closed": {
                    "type": "object",
                    "properties": {"a": {"type": "integer"}},
                    "additionalProperties": true
                }
            },
            "$defs": {
                "Order": {
                    "type": "object",
                    "properties": {
                        "attrs": {
                            "anyOf": [
                                {"type": "null"},
                                {"type": "object", "additionalProperties": {"$ref": "#/definitions/Attr"}}
                            ]
                        }
                    }
                }
            },
            "definitions": {
                "Attr": {
                    "type": "object",
                    "patternProperties": {"^x-": {"type": "string"}}
                }
            }
        });
        let model = JsonSchemaModel::from_value(&schema).unwrap();

        assert!(model.is_open_mapping("labels"));
        assert!(model.is_open_mapping("orders.attrs"));
        assert!(model.is_open_mapping("orders.attrs.*"));
        assert!(!model.is_open_mapping("closed"));
        assert!(!model.is_open_mapping("name"));
    }

    #[test]
    fn test_unresolvable_ref() {
        let schema = json!({"properties": {"a": {"$ref": "#/$defs/Missing"}}});
        assert!(matches!(
            JsonSchemaModel::from_value(&schema),
            Err(AnalysisError::RecordModel(_))
        ));
    }

    #[test]
    fn test_recursive_ref_terminates() {
        let schema = json!({
            "$ref": "#/$defs/Node",
            "$defs": {"Node": {
                "properties": {
                    "next": {"$ref": "#/$defs/Node"},
                    "tags": {"additionalProperties": {"type": "string"}}
                }
            }}
        });
        let model = JsonSchemaModel::from_value(&schema).unwrap();
        assert!(model.is_open_mapping("tags"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, r#"{"properties": {"m": {"additionalProperties": true}}}"#).unwrap();
        let model = JsonSchemaModel::from_path(&path).unwrap();
        assert!(model.is_open_mapping("m"));
    }
}
