//! Error types for Dossier Core
//!
//! Three families of failure flow through the pipeline:
//!
//! - [`ValidationError`]: user-correctable input problems, rejected before any
//!   provider call and surfaced verbatim.
//! - [`ProviderError`]: anything that went wrong talking to the text-generation
//!   provider. Only [`ProviderError::public_message`] ever reaches a user.
//! - [`DossierError::InvalidTransition`]: the caller asked the orchestrator for
//!   an action its current state does not allow.
//!
//! Parse degradation (the normalizer finding no structure) is not an error and
//! has no variant here.

use thiserror::Error;

/// Result type alias for Dossier operations
pub type Result<T> = std::result::Result<T, DossierError>;

/// Generic message shown to users for any provider failure.
pub const PROVIDER_FAILURE_MESSAGE: &str = "Failed to generate content. Please try again.";

/// Main error type for Dossier operations
#[derive(Error, Debug)]
pub enum DossierError {
    /// Input rejected at the boundary
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Provider call failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Action not permitted in the current pipeline state
    #[error("Cannot {action} while pipeline is {from}")]
    InvalidTransition { from: String, action: String },

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors caused by missing or empty input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter some data")]
    EmptySubject,

    #[error("{0} field required")]
    MissingField(&'static str),

    #[error("Stage content is empty")]
    EmptyContent,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

/// Errors raised by the text-generation provider or its transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Provider call timed out")]
    Timeout,

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// The message safe to show a user. Never includes provider internals.
    pub fn public_message(&self) -> &'static str {
        PROVIDER_FAILURE_MESSAGE
    }
}

impl DossierError {
    /// Message suitable for display to an end user.
    ///
    /// Validation and transition errors are user-correctable and shown as-is;
    /// provider and serialization details are replaced by a generic message.
    pub fn user_message(&self) -> String {
        match self {
            DossierError::Validation(e) => e.to_string(),
            DossierError::InvalidTransition { .. } => self.to_string(),
            DossierError::Provider(e) => e.public_message().to_string(),
            DossierError::Serialization(_) => PROVIDER_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err: DossierError = ValidationError::MissingField("company").into();
        assert_eq!(err.user_message(), "company field required");
    }

    #[test]
    fn test_provider_message_hides_internals() {
        let err: DossierError = ProviderError::Status {
            status: 403,
            body: "API key sk-secret is invalid".to_string(),
        }
        .into();

        let message = err.user_message();
        assert_eq!(message, PROVIDER_FAILURE_MESSAGE);
        assert!(!message.contains("sk-secret"));
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = DossierError::InvalidTransition {
            from: "idle".to_string(),
            action: "analyze".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot analyze while pipeline is idle");
    }
}
