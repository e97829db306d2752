//! Reading and checking spec documents
//!
//! Loading walks the document by hand so that errors name the node they
//! were found at. Unknown keys are ignored.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{Presence, SPEC_VERSION, Shape, Spec, SpecError, SpecMetadata, SpecNode};
use crate::hints::{Hint, MAX_GENERATED_LEN, NumberParams};

const METADATA_PATH: &str = "$.metadata";

pub(super) fn load_spec(value: &Value) -> Result<Spec, SpecError> {
    let doc = value
        .as_object()
        .ok_or_else(|| SpecError::format("$", "document must be a JSON object"))?;
    let metadata = load_metadata(doc.get("metadata"))?;
    let root = doc
        .get("root")
        .ok_or_else(|| SpecError::format("$", "missing field `root`"))?;
    Ok(Spec {
        metadata,
        root: load_node(root, "$")?,
    })
}

fn load_metadata(value: Option<&Value>) -> Result<SpecMetadata, SpecError> {
    let obj = value
        .and_then(Value::as_object)
        .ok_or_else(|| SpecError::format(METADATA_PATH, "missing metadata object"))?;
    let count = |key: &str| -> Result<usize, SpecError> {
        obj.get(key)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
            .ok_or_else(|| {
                SpecError::format(
                    METADATA_PATH,
                    format!("`{}` must be a non-negative integer", key),
                )
            })
    };
    let version = match obj.get("version") {
        None => SPEC_VERSION,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| SpecError::format(METADATA_PATH, "`version` must be an integer"))?,
    };
    Ok(SpecMetadata {
        samples_analyzed: count("samplesAnalyzed")?,
        data_points: count("dataPoints")?,
        unclassifiable: count("unclassifiable")?,
        version,
    })
}

fn load_node(value: &Value, path: &str) -> Result<SpecNode, SpecError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SpecError::format(path, "node must be a JSON object"))?;
    let presence = Presence {
        missing: rate(obj, "missing", path)?,
        null: rate(obj, "null", path)?,
    };
    let tag = obj
        .get("shape")
        .and_then(Value::as_str)
        .ok_or_else(|| SpecError::format(path, "missing field `shape`"))?;

    let shape = match tag {
        "value" => Shape::Value {
            hint: load_hint(required(obj, "hint", path)?, path)?,
        },
        "object" => {
            let fields = required(obj, "fields", path)?
                .as_object()
                .ok_or_else(|| SpecError::format(path, "`fields` must be an object"))?;
            let mut loaded = BTreeMap::new();
            for (key, child) in fields {
                loaded.insert(key.clone(), load_node(child, &key_path(path, key))?);
            }
            Shape::Object { fields: loaded }
        }
        "fixed" => {
            let length = required(obj, "length", path)?
                .as_u64()
                .ok_or_else(|| SpecError::format(path, "`length` must be a non-negative integer"))?
                as usize;
            let elements = required(obj, "elements", path)?
                .as_array()
                .ok_or_else(|| SpecError::format(path, "`elements` must be an array"))?
                .iter()
                .enumerate()
                .map(|(i, element)| load_node(element, &format!("{}[{}]", path, i)))
                .collect::<Result<Vec<_>, _>>()?;
            Shape::Fixed { length, elements }
        }
        "variable" => Shape::Variable {
            length: load_params(required(obj, "length", path)?, path)?,
            element: Box::new(load_node(
                required(obj, "element", path)?,
                &format!("{}[]", path),
            )?),
        },
        "dynamic-keys" => Shape::DynamicKeys {
            count: load_params(required(obj, "count", path)?, path)?,
            key: load_hint(required(obj, "key", path)?, path)?,
            value: Box::new(load_node(
                required(obj, "value", path)?,
                &format!("{}{{}}", path),
            )?),
        },
        other => {
            return Err(SpecError::format(path, format!("unknown shape `{}`", other)));
        }
    };

    Ok(SpecNode { presence, shape })
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Value, SpecError> {
    obj.get(key)
        .ok_or_else(|| SpecError::format(path, format!("missing field `{}`", key)))
}

fn rate(obj: &Map<String, Value>, key: &str, path: &str) -> Result<f64, SpecError> {
    match obj.get(key) {
        None => Ok(0.0),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| SpecError::format(path, format!("`{}` must be a number", key))),
    }
}

fn load_hint(value: &Value, path: &str) -> Result<Hint, SpecError> {
    Hint::deserialize(value).map_err(|e| SpecError::format(path, e.to_string()))
}

fn load_params(value: &Value, path: &str) -> Result<NumberParams, SpecError> {
    NumberParams::deserialize(value).map_err(|e| SpecError::format(path, e.to_string()))
}

fn key_path(parent: &str, key: &str) -> String {
    if parent == "$" {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

pub(super) fn validate_spec(spec: &Spec) -> Result<(), SpecError> {
    let metadata = &spec.metadata;
    if metadata.version > SPEC_VERSION {
        return Err(SpecError::format(
            METADATA_PATH,
            format!("unsupported spec version {}", metadata.version),
        ));
    }
    if metadata.unclassifiable > metadata.data_points {
        return Err(SpecError::shape(
            METADATA_PATH,
            "more unclassifiable values than data points",
        ));
    }
    if !matches!(spec.root.shape, Shape::Object { .. }) {
        return Err(SpecError::shape("$", "root must be an object node"));
    }
    if spec.root.presence != Presence::always() {
        return Err(SpecError::shape("$", "root cannot be missing or null"));
    }
    validate_node(&spec.root, "$")
}

fn validate_node(node: &SpecNode, path: &str) -> Result<(), SpecError> {
    for (name, rate) in [("missing", node.presence.missing), ("null", node.presence.null)] {
        if !(0.0..=1.0).contains(&rate) {
            return Err(SpecError::format(
                path,
                format!("`{}` rate {} outside [0, 1]", name, rate),
            ));
        }
    }

    match &node.shape {
        Shape::Value { hint } => check_hint(hint, path),
        Shape::Object { fields } => {
            for (key, child) in fields {
                validate_node(child, &key_path(path, key))?;
            }
            Ok(())
        }
        Shape::Fixed { length, elements } => {
            if *length != elements.len() {
                return Err(SpecError::shape(
                    path,
                    format!("length {} but {} element specs", length, elements.len()),
                ));
            }
            for (i, element) in elements.iter().enumerate() {
                let element_path = format!("{}[{}]", path, i);
                never_missing(element, &element_path)?;
                validate_node(element, &element_path)?;
            }
            Ok(())
        }
        Shape::Variable { length, element } => {
            check_count(length, path, "length")?;
            let element_path = format!("{}[]", path);
            never_missing(element, &element_path)?;
            validate_node(element, &element_path)
        }
        Shape::DynamicKeys { count, key, value } => {
            check_count(count, path, "count")?;
            check_hint(key, path)?;
            let value_path = format!("{}{{}}", path);
            never_missing(value, &value_path)?;
            validate_node(value, &value_path)
        }
    }
}

fn check_hint(hint: &Hint, path: &str) -> Result<(), SpecError> {
    hint.check_size().map_err(|m| SpecError::shape(path, m))?;
    hint.check().map_err(|m| SpecError::format(path, m))
}

fn check_count(params: &NumberParams, path: &str, name: &str) -> Result<(), SpecError> {
    params
        .check()
        .map_err(|m| SpecError::shape(path, format!("{}: {}", name, m)))?;
    if params.min < 0.0 {
        return Err(SpecError::shape(path, format!("{} cannot be negative", name)));
    }
    let upper = params.tail.map_or(params.max, |tail| tail.max.max(params.max));
    if upper > MAX_GENERATED_LEN as f64 {
        return Err(SpecError::shape(
            path,
            format!("{} {} exceeds the limit of {}", name, upper, MAX_GENERATED_LEN),
        ));
    }
    Ok(())
}

fn never_missing(node: &SpecNode, path: &str) -> Result<(), SpecError> {
    if node.presence.missing > 0.0 {
        return Err(SpecError::shape(
            path,
            "array elements and mapping values cannot be missing",
        ));
    }
    Ok(())
}
