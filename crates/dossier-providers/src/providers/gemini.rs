use async_trait::async_trait;
use dossier_core::{ProviderError, TextProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProviderSettings;

/// Google Gemini `generateContent` over REST
#[derive(Debug, Clone)]
pub struct GeminiClient {
    pub name: String,
    api_key: String,
    model: String,
    base_url: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    http_client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            name: format!("Gemini {}", model),
            api_key: api_key.into(),
            model,
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
            temperature: None,
            max_tokens: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Build a client from settings. The settings must carry a resolved key.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured(settings.api_key_env.clone()))?;

        let mut client = Self::new(api_key, settings.model.clone())
            .with_base_url(settings.base_url.clone())
            .with_timeout(Duration::from_secs(settings.timeout_secs))?;
        if let Some(value) = settings.temperature {
            client = client.with_temperature(value);
        }
        if let Some(value) = settings.max_output_tokens {
            client = client.with_max_tokens(value);
        }
        Ok(client)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Whole-request timeout enforced by the HTTP client
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ProviderError> {
        self.http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn request_completion(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        let generation_config = match (self.temperature, self.max_tokens) {
            (None, None) => None,
            (temperature, max_output_tokens) => Some(GeminiGenerationConfig {
                temperature,
                max_output_tokens,
            }),
        };
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config,
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        let completion: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(completion.text())
    }
}

fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Transport(error.to_string())
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    /// Text parts of the first candidate joined together, if any
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl TextProvider for GeminiClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, ProviderError> {
        self.request_completion(prompt).await
    }
}
