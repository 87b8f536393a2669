//! Core types for Dossier
//!
//! - Timestamps
//! - Canonical records produced by the normalizer
//! - Validated pipeline requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ValidationError;

/// Timestamp type alias
pub type Timestamp = DateTime<Utc>;

/// Best-effort key/value structure extracted from arbitrary input text.
///
/// Keys are always normalized with [`normalize_key`]. The record is built once
/// by the normalizer and is read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord(BTreeMap<String, String>);

impl CanonicalRecord {
    /// Look up a field by its normalized key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pretty JSON rendering used by previews
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }

    /// Build a record from a JSON object, stringifying non-string values.
    pub(crate) fn from_json_object(object: serde_json::Map<String, serde_json::Value>) -> Self {
        object
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for CanonicalRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = BTreeMap::new();
        for (key, value) in iter {
            map.insert(normalize_key(key.as_ref()), value.into());
        }
        Self(map)
    }
}

/// Normalize a field label to lowercase snake form.
///
/// Trims, lowercases and collapses every whitespace run into a single `_`.
pub fn normalize_key(label: &str) -> String {
    label
        .trim()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// A validated request to run the report stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRequest {
    subject: String,
}

impl PipelineRequest {
    /// Validate a raw subject. Empty or whitespace-only input is rejected.
    pub fn new(subject: impl AsRef<str>) -> Result<Self, ValidationError> {
        let subject = subject.as_ref().trim();
        if subject.is_empty() {
            return Err(ValidationError::EmptySubject);
        }
        Ok(Self {
            subject: subject.to_string(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl fmt::Display for PipelineRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.subject)
    }
}
