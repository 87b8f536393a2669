//! Provider configuration
//!
//! Settings come from the environment (after `.env` loading by the binaries)
//! or from a JSON file. The API key is never written back out.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the Gemini provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Inline API key. Prefer `api_key_env`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Transport timeout for a whole request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl ProviderSettings {
    /// Read settings from process environment variables.
    ///
    /// Fails when `GEMINI_API_KEY` is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(model) = lookup("GEMINI_MODEL").filter(|v| !v.trim().is_empty()) {
            settings.model = model;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            settings.base_url = base_url;
        }
        if let Some(timeout) = lookup("DOSSIER_PROVIDER_TIMEOUT_SECS") {
            settings.timeout_secs = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid DOSSIER_PROVIDER_TIMEOUT_SECS: {timeout}"))?;
        }
        settings.api_key = Some(settings.resolve_api_key(&lookup)?);
        Ok(settings)
    }

    /// Load settings from a JSON file, resolving the key from the environment
    /// when the file does not carry one.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read provider config at {:?}", path))?;
        let mut settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid provider config JSON at {:?}", path))?;
        let key = settings.resolve_api_key(&|name: &str| std::env::var(name).ok())?;
        settings.api_key = Some(key);
        Ok(settings)
    }

    /// Save settings (without the API key) to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write provider config at {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn resolve_api_key(&self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => anyhow::bail!("Missing API key. Set {}.", self.api_key_env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = ProviderSettings::from_vars(vars(&[])).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        assert!(ProviderSettings::from_vars(vars(&[("GEMINI_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn test_defaults_from_env() {
        let settings = ProviderSettings::from_vars(vars(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("k"));
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_overrides_from_env() {
        let settings = ProviderSettings::from_vars(vars(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_BASE_URL", "http://localhost:9999"),
            ("DOSSIER_PROVIDER_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(settings.model, "gemini-2.0-flash");
        assert_eq!(settings.base_url, "http://localhost:9999");
        assert_eq!(settings.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_timeout() {
        let result = ProviderSettings::from_vars(vars(&[
            ("GEMINI_API_KEY", "k"),
            ("DOSSIER_PROVIDER_TIMEOUT_SECS", "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_file_round_trip_omits_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.json");

        let settings = ProviderSettings::default()
            .with_api_key("secret")
            .with_model("gemini-2.0-flash")
            .with_timeout_secs(10);
        settings.to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let parsed: ProviderSettings = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.model, "gemini-2.0-flash");
        assert_eq!(parsed.timeout_secs, 10);
        assert_eq!(parsed.api_key, None);
    }

    #[test]
    fn test_file_with_inline_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.json");
        std::fs::write(&path, r#"{ "api_key": "inline", "model": "m" }"#).unwrap();

        let settings = ProviderSettings::from_file(&path).unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("inline"));
        assert_eq!(settings.model, "m");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }
}
