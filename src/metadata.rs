use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::WebhookError;

/// Text stored for a null metadata value.
pub const NULL_VALUE: &str = "<nil>";

/// Annotations and labels already present on the target object.
///
/// `None` means the field does not exist on the object (or is not a mapping).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataMaps {
    pub annotations: Option<BTreeMap<String, String>>,
    pub labels: Option<BTreeMap<String, String>>,
}

/// Pull `metadata.annotations` and `metadata.labels` out of a raw object.
///
/// Only fails when `raw` is not JSON at all; a missing or oddly shaped
/// `metadata` yields empty results.
pub fn extract(raw: &[u8]) -> Result<MetadataMaps, WebhookError> {
    let object: Value = serde_json::from_slice(raw).map_err(WebhookError::MalformedObject)?;
    Ok(extract_from_value(&object))
}

pub fn extract_from_value(object: &Value) -> MetadataMaps {
    let metadata = match object.get("metadata") {
        Some(Value::Object(metadata)) => metadata,
        _ => return MetadataMaps::default(),
    };

    MetadataMaps {
        annotations: string_map(metadata, "annotations"),
        labels: string_map(metadata, "labels"),
    }
}

fn string_map(metadata: &Map<String, Value>, field: &str) -> Option<BTreeMap<String, String>> {
    match metadata.get(field) {
        Some(Value::Object(entries)) => Some(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_string(v)))
                .collect(),
        ),
        _ => None,
    }
}

/// Render any JSON value as the string stored in the metadata map. Null
/// renders as `<nil>`, so a null entry counts as set and is never replaced.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => NULL_VALUE.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
