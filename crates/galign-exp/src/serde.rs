//! Encoding helpers shared by manifests, kernel requests and YAML configs.

use std::collections::BTreeMap;

use galign_core::errors::{AlignError, ErrorInfo};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

fn encoding_error(code: &str, format: &str, err: impl ToString) -> AlignError {
    AlignError::Serde(ErrorInfo::new(code, err.to_string()).with_context("format", format))
}

/// Recursively sorts object keys so equal payloads encode to equal bytes.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        scalar => scalar,
    }
}

/// Pretty JSON with sorted keys. Manifests, summaries and kernel requests
/// are written this way so reruns produce identical files.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, AlignError> {
    let value = serde_json::to_value(value).map_err(|err| encoding_error("encode", "json", err))?;
    let mut bytes = Vec::new();
    serde_json::to_writer_pretty(&mut bytes, &sort_keys(value))
        .map_err(|err| encoding_error("encode", "json", err))?;
    Ok(bytes)
}

/// Decodes a JSON document.
pub fn from_json_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, AlignError> {
    serde_json::from_slice(data).map_err(|err| encoding_error("decode", "json", err))
}

/// Decodes a YAML configuration file.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, AlignError> {
    serde_yaml::from_slice(data).map_err(|err| encoding_error("decode", "yaml", err))
}
