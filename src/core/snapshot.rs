//! Immutable configuration snapshots and the dual-format decode pipeline.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::{DecodeError, FormatError, Result};

/// One successfully decoded configuration state.
///
/// A snapshot is a flat `String -> String` mapping. It is produced whole by
/// one decode and never mutated afterwards; a reload builds a brand-new
/// snapshot and publishes it in place of the old one.
///
/// Scalar values of either format are coerced to their textual form when the
/// snapshot is built, so `age: 77` and `"age": "77"` read identically.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    values: HashMap<String, String>,
}

impl Snapshot {
    /// Look up the raw string value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of keys held by this snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether this snapshot holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the key/value pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Decode file contents into a snapshot.
    ///
    /// YAML is attempted first. If YAML rejects the document the failure is
    /// logged and JSON is tried; both rejections travel in the returned
    /// [`DecodeError`] so the intended format can be diagnosed.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, DecodeError> {
        let yaml = match decode_yaml(bytes) {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) => err,
        };
        debug!(error = %yaml, "document rejected as YAML, trying JSON");

        match decode_json(bytes) {
            Ok(snapshot) => Ok(snapshot),
            Err(json) => Err(DecodeError { yaml, json }),
        }
    }

    /// Read `path` and decode its contents in one step.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::decode(&bytes)?)
    }
}

fn decode_yaml(bytes: &[u8]) -> std::result::Result<Snapshot, FormatError> {
    let doc: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
    let serde_yaml::Value::Mapping(entries) = doc else {
        return Err(FormatError::NotAMapping);
    };

    let mut values = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let serde_yaml::Value::String(key) = key else {
            return Err(FormatError::NonStringKey);
        };
        let text = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => return Err(FormatError::NonScalar(key)),
        };
        values.insert(key, text);
    }

    Ok(Snapshot { values })
}

fn decode_json(bytes: &[u8]) -> std::result::Result<Snapshot, FormatError> {
    let doc: serde_json::Value = serde_json::from_slice(bytes)?;
    let serde_json::Value::Object(entries) = doc else {
        return Err(FormatError::NotAMapping);
    };

    let mut values = HashMap::with_capacity(entries.len());
    for (key, value) in entries {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return Err(FormatError::NonScalar(key)),
        };
        values.insert(key, text);
    }

    Ok(Snapshot { values })
}
