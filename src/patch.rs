//! JSON patch planning for the username injection.
//!
//! Every field is planned on its own and always yields exactly one `add`
//! operation that replaces the whole map. Existing entries are carried over
//! into the new value, so the patch extends the map without overwriting keys
//! that already hold a value.

use std::collections::BTreeMap;

use json_patch::{AddOperation, Patch, PatchOperation};
use jsonptr::PointerBuf;
use serde_json::Value;

use crate::config::Injections;
use crate::metadata::MetadataMaps;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataField {
    Annotations,
    Labels,
}

impl MetadataField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::Annotations => "annotations",
            MetadataField::Labels => "labels",
        }
    }

    /// JSON pointer to the field, e.g. `/metadata/labels`
    pub fn path(&self) -> PointerBuf {
        PointerBuf::from_tokens(["metadata", self.as_str()])
    }
}

/// Plan the operation for one metadata field.
///
/// When the field is absent the injected entries become the whole map. When
/// it exists, injected keys are only set where the current value is missing
/// or empty.
pub fn plan(
    existing: Option<BTreeMap<String, String>>,
    inject: &BTreeMap<String, String>,
    field: MetadataField,
) -> Vec<PatchOperation> {
    let value = match existing {
        None => inject.clone(),
        Some(mut existing) => {
            for (key, value) in inject {
                let current = existing.entry(key.clone()).or_default();
                if current.is_empty() {
                    *current = value.clone();
                }
            }
            existing
        }
    };

    vec![PatchOperation::Add(AddOperation {
        path: field.path(),
        value: to_json_map(value),
    })]
}

/// Operations for both fields, annotations first.
pub fn create_patch(existing: MetadataMaps, injections: &Injections) -> Patch {
    let mut ops = plan(
        existing.annotations,
        &injections.annotations,
        MetadataField::Annotations,
    );
    ops.extend(plan(
        existing.labels,
        &injections.labels,
        MetadataField::Labels,
    ));
    Patch(ops)
}

fn to_json_map(map: BTreeMap<String, String>) -> Value {
    Value::Object(
        map.into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    )
}
