//! Generation Client
//!
//! [`TextProvider`] is the seam to the external text-generation service: a
//! single `generate(prompt)` operation that yields text, nothing, or an error.
//! [`GenerationClient`] wraps a provider and guarantees callers always get a
//! usable string when the provider answered, substituting
//! [`NO_CONTENT_FALLBACK`] for textless responses. Transport failures stay
//! errors.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::error::ProviderError;

/// Returned in place of an empty but successful provider response
pub const NO_CONTENT_FALLBACK: &str = "No content generated.";

/// External text-generation provider
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Human readable provider name, used in logs
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    ///
    /// `Ok(None)` means the provider was reachable but returned no
    /// extractable text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ProviderError>;
}

/// Injected handle used by the orchestrator and the HTTP gateway.
#[derive(Clone)]
pub struct GenerationClient {
    provider: Arc<dyn TextProvider>,
}

impl fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationClient")
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Forward a prompt to the provider.
    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(
            provider = self.provider.name(),
            prompt_len = prompt.len(),
            "Calling provider"
        );

        match self.provider.generate(prompt).await {
            Ok(Some(text)) if !text.trim().is_empty() => Ok(text),
            Ok(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    "Provider returned no text, using fallback"
                );
                Ok(NO_CONTENT_FALLBACK.to_string())
            }
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "Provider call failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Result<Option<String>, ProviderError>);

    #[async_trait]
    impl TextProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<Option<String>, ProviderError> {
            self.0.clone()
        }
    }

    fn client(response: Result<Option<String>, ProviderError>) -> GenerationClient {
        GenerationClient::new(Arc::new(FixedProvider(response)))
    }

    #[tokio::test]
    async fn test_text_passes_through() {
        let text = client(Ok(Some("# Acme".to_string())))
            .generate("p")
            .await
            .unwrap();
        assert_eq!(text, "# Acme");
    }

    #[tokio::test]
    async fn test_missing_text_uses_fallback() {
        assert_eq!(client(Ok(None)).generate("p").await.unwrap(), NO_CONTENT_FALLBACK);
        assert_eq!(
            client(Ok(Some("  \n".to_string()))).generate("p").await.unwrap(),
            NO_CONTENT_FALLBACK
        );
    }

    #[test]
    fn test_transport_failure_propagates() {
        let err = tokio_test::block_on(client(Err(ProviderError::Timeout)).generate("p")).unwrap_err();
        assert_eq!(err, ProviderError::Timeout);
    }
}
