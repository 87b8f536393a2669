//! Request and response bodies of the HTTP API

use dossier_core::{CanonicalRecord, Normalized};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GENERATE_SUCCESS_MESSAGE: &str = "Markdown generated successfully";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";
pub const INVALID_MARKDOWN_MESSAGE: &str = "Invalid markdown input";
pub const ANALYZE_FAILURE_MESSAGE: &str = "Failed to analyze markdown";

/// Body of `POST /api/generate-md`
///
/// `company` is kept untyped so that a number or object is reported as a
/// missing field rather than a body parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub company: Option<Value>,
}

impl GenerateRequest {
    /// The company name when it is a non-blank string
    pub fn company(&self) -> Option<&str> {
        match &self.company {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: String,
    pub markdown: String,
}

/// Error shape used by `generate-md`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub markdown: Option<Value>,
}

impl AnalyzeRequest {
    pub fn markdown(&self) -> Option<&str> {
        match &self.markdown {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzeStatus {
    Success,
    Error,
}

/// Result of `POST /api/analyze`, successful or not
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub output: String,
    pub status: AnalyzeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalyzeResponse {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            status: AnalyzeStatus::Success,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            status: AnalyzeStatus::Error,
            message: Some(message.into()),
        }
    }
}

/// Body of `POST /api/normalize`
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeRequest {
    #[serde(default)]
    pub input: String,
}

/// Normalizer preview: the rule that matched (or `raw`) and its record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub rule: String,
    pub record: Option<CanonicalRecord>,
}

impl From<Normalized> for NormalizeResponse {
    fn from(normalized: Normalized) -> Self {
        let rule = normalized
            .rule()
            .map(|rule| rule.as_str())
            .unwrap_or("raw")
            .to_string();
        Self {
            rule,
            record: normalized.into_record(),
        }
    }
}

/// Body of `POST /api/render`
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub markdown: String,
}
