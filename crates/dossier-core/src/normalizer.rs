//! Input Normalizer
//!
//! Turns free-form user (or provider) text into a [`CanonicalRecord`].
//!
//! Rules run in a fixed order and the first one that yields a record wins:
//!
//! 1. [`StrictJson`]: the whole trimmed input is a JSON object
//! 2. [`EmbeddedJson`]: the span from the first `{` to the last `}` is a JSON object
//! 3. [`MarkdownFields`]: `### Heading` and `**Label:** value` lines
//! 4. [`ShortText`]: up to three plain lines mapped to name, location, website
//!
//! When no rule matches the input is kept as opaque raw text. That outcome is
//! a normal degradation, not an error.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::types::{normalize_key, CanonicalRecord};

lazy_static! {
    /// `**Label:** value` or `**Label**: value`, anywhere on the line.
    static ref BOLD_FIELD: Regex =
        Regex::new(r"\*\*([^:*]+)(?::\*\*|\*\*:)\s*(.+)").unwrap();
}

/// Identifies which rule produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeRule {
    StrictJson,
    EmbeddedJson,
    MarkdownFields,
    ShortText,
}

impl NormalizeRule {
    pub fn as_str(self) -> &'static str {
        match self {
            NormalizeRule::StrictJson => "strict_json",
            NormalizeRule::EmbeddedJson => "embedded_json",
            NormalizeRule::MarkdownFields => "markdown_fields",
            NormalizeRule::ShortText => "short_text",
        }
    }
}

/// A single pure extraction strategy.
pub trait ExtractionRule: Send + Sync {
    /// Which rule this is
    fn rule(&self) -> NormalizeRule;

    /// Try to extract a record. `None` means "fall through to the next rule".
    fn extract(&self, input: &str) -> Option<CanonicalRecord>;
}

/// Outcome of normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// A rule found structure
    Structured {
        rule: NormalizeRule,
        record: CanonicalRecord,
    },
    /// No structure detected; the caller should treat the input as raw text
    Raw(String),
}

impl Normalized {
    pub fn record(&self) -> Option<&CanonicalRecord> {
        match self {
            Normalized::Structured { record, .. } => Some(record),
            Normalized::Raw(_) => None,
        }
    }

    pub fn into_record(self) -> Option<CanonicalRecord> {
        match self {
            Normalized::Structured { record, .. } => Some(record),
            Normalized::Raw(_) => None,
        }
    }

    pub fn rule(&self) -> Option<NormalizeRule> {
        match self {
            Normalized::Structured { rule, .. } => Some(*rule),
            Normalized::Raw(_) => None,
        }
    }

    /// Preview text: pretty JSON for records, the raw input otherwise
    pub fn preview(&self) -> String {
        match self {
            Normalized::Structured { record, .. } => record.to_pretty_json(),
            Normalized::Raw(raw) => raw.clone(),
        }
    }
}

/// Whole input parsed as a JSON object
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictJson;

impl ExtractionRule for StrictJson {
    fn rule(&self) -> NormalizeRule {
        NormalizeRule::StrictJson
    }

    fn extract(&self, input: &str) -> Option<CanonicalRecord> {
        parse_object(input.trim())
    }
}

/// Greedy first-`{` to last-`}` span parsed as a JSON object
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedJson;

impl ExtractionRule for EmbeddedJson {
    fn rule(&self) -> NormalizeRule {
        NormalizeRule::EmbeddedJson
    }

    fn extract(&self, input: &str) -> Option<CanonicalRecord> {
        let start = input.find('{')?;
        let end = input.rfind('}')?;
        if end <= start {
            return None;
        }
        parse_object(&input[start..=end])
    }
}

/// Markdown headings and bold key/value lines
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownFields;

impl ExtractionRule for MarkdownFields {
    fn rule(&self) -> NormalizeRule {
        NormalizeRule::MarkdownFields
    }

    fn extract(&self, input: &str) -> Option<CanonicalRecord> {
        let mut fields: Vec<(String, String)> = Vec::new();

        for line in input.trim().lines() {
            let line = line.trim();

            if let Some(heading) = line.strip_prefix("###") {
                fields.push(("name".to_string(), heading.trim_start().to_string()));
            } else if let Some(caps) = BOLD_FIELD.captures(line) {
                let key = normalize_key(&caps[1]);
                if key.is_empty() {
                    continue;
                }
                fields.push((key, caps[2].trim().to_string()));
            }
        }

        // Later lines override earlier ones for the same key
        let record: CanonicalRecord = fields.into_iter().collect();
        if record.is_empty() {
            None
        } else {
            Some(record)
        }
    }
}

/// Up to three short plain lines: name, location, website
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortText;

impl ShortText {
    const FIELDS: [&'static str; 3] = ["name", "location", "website"];
}

impl ExtractionRule for ShortText {
    fn rule(&self) -> NormalizeRule {
        NormalizeRule::ShortText
    }

    fn extract(&self, input: &str) -> Option<CanonicalRecord> {
        let lines: Vec<&str> = input
            .trim()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        if lines.is_empty() || lines.len() > Self::FIELDS.len() {
            return None;
        }
        if input.contains(':') || input.contains("**") {
            return None;
        }

        Some(Self::FIELDS.iter().copied().zip(lines).collect())
    }
}

fn parse_object(text: &str) -> Option<CanonicalRecord> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(serde_json::Value::Object(object)) => Some(CanonicalRecord::from_json_object(object)),
        _ => None,
    }
}

/// Ordered chain of extraction rules.
pub struct Normalizer {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.rule()))
            .finish()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(StrictJson),
                Box::new(EmbeddedJson),
                Box::new(MarkdownFields),
                Box::new(ShortText),
            ],
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> Vec<NormalizeRule> {
        self.rules.iter().map(|r| r.rule()).collect()
    }

    /// Run the chain; the first rule returning a record wins.
    pub fn normalize(&self, raw: &str) -> Normalized {
        for rule in &self.rules {
            if let Some(record) = rule.extract(raw) {
                tracing::debug!(
                    rule = rule.rule().as_str(),
                    fields = record.len(),
                    "Input normalized"
                );
                return Normalized::Structured {
                    rule: rule.rule(),
                    record,
                };
            }
        }

        tracing::debug!(len = raw.len(), "No structure detected, keeping raw text");
        Normalized::Raw(raw.to_string())
    }
}

/// Normalize with the default rule chain.
pub fn normalize(raw: &str) -> Option<CanonicalRecord> {
    Normalizer::default().normalize(raw).into_record()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(pairs: &[(&str, &str)]) -> CanonicalRecord {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_strict_json() {
        assert_eq!(
            normalize(r#"{"name":"Acme"}"#),
            Some(record(&[("name", "Acme")]))
        );
    }

    #[test]
    fn test_strict_json_non_object_falls_through() {
        // A bare JSON string is valid JSON but not a mapping
        let normalized = Normalizer::new().normalize(r#""Acme""#);
        assert_eq!(normalized.rule(), Some(NormalizeRule::ShortText));
        assert_eq!(normalized.record().unwrap().get("name"), Some("\"Acme\""));
    }

    #[test]
    fn test_short_text() {
        assert_eq!(
            normalize("Acme\nNYC\nacme.com"),
            Some(record(&[
                ("name", "Acme"),
                ("location", "NYC"),
                ("website", "acme.com"),
            ]))
        );
    }

    #[test]
    fn test_short_text_partial_lines() {
        assert_eq!(normalize("  Acme  \n\n"), Some(record(&[("name", "Acme")])));
    }

    #[test]
    fn test_short_text_rejects_colon_and_long_input() {
        assert_eq!(normalize("https://acme.com"), None);
        assert_eq!(normalize("a\nb\nc\nd"), None);
        assert_eq!(normalize("   \n  "), None);
    }

    #[test]
    fn test_markdown_fields() {
        assert_eq!(
            normalize("### Acme\n**Industry:** Tech"),
            Some(record(&[("name", "Acme"), ("industry", "Tech")]))
        );
    }

    #[test]
    fn test_markdown_both_bold_forms() {
        let result = normalize("**Head Office**: Berlin\n- **Founded In:**  1999 ").unwrap();
        assert_eq!(result.get("head_office"), Some("Berlin"));
        assert_eq!(result.get("founded_in"), Some("1999"));
    }

    #[test]
    fn test_markdown_later_line_wins() {
        let result = normalize("### Acme\n**Name:** Acme Corp").unwrap();
        assert_eq!(result.get("name"), Some("Acme Corp"));
    }

    #[test]
    fn test_embedded_json() {
        let input = "Here is the data you asked for:\n```json\n{\"name\": \"Acme\", \"size\": 10}\n```";
        let normalized = Normalizer::new().normalize(input);
        assert_eq!(normalized.rule(), Some(NormalizeRule::EmbeddedJson));
        assert_eq!(
            normalized.into_record(),
            Some(record(&[("name", "Acme"), ("size", "10")]))
        );
    }

    #[test]
    fn test_broken_embedded_json_falls_to_markdown() {
        let input = "{ oops\n### Acme\n**Sector:** Retail }";
        let normalized = Normalizer::new().normalize(input);
        assert_eq!(normalized.rule(), Some(NormalizeRule::MarkdownFields));
        assert_eq!(normalized.record().unwrap().get("sector"), Some("Retail }"));
    }

    #[test]
    fn test_raw_fallback() {
        let input = "Tell me about: Google, Microsoft\nand Amazon\nplease\nthanks";
        let normalized = Normalizer::new().normalize(input);
        assert_eq!(normalized, Normalized::Raw(input.to_string()));
        assert_eq!(normalized.preview(), input);
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            Normalizer::new().rules(),
            vec![
                NormalizeRule::StrictJson,
                NormalizeRule::EmbeddedJson,
                NormalizeRule::MarkdownFields,
                NormalizeRule::ShortText,
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_normalize_is_deterministic(input in "(?s).{0,200}") {
            let normalizer = Normalizer::new();
            let first = normalizer.normalize(&input);
            let second = normalizer.normalize(&input);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_keys_are_snake_case(input in "(\\*\\*[A-Za-z ]{1,12}:\\*\\* [a-z]{1,8}\n){1,4}") {
            if let Some(record) = normalize(&input) {
                for (key, _) in record.iter() {
                    prop_assert!(!key.contains(' '));
                    prop_assert_eq!(key.to_lowercase(), key);
                }
            }
        }
    }
}
