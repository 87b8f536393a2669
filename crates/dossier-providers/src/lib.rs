//! Dossier Providers - concrete text-generation backends
//!
//! The core crate only knows the `TextProvider` trait. This crate supplies
//! the Gemini REST client behind it, plus the settings that configure it.
//!
//! ```no_run
//! use dossier_providers::{build_provider, ProviderSettings};
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = ProviderSettings::from_env()?;
//! let provider = build_provider(&settings)?;
//! println!("using {}", provider.name());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations)]

pub mod config;
pub mod providers;

use dossier_core::TextProvider;
use std::sync::Arc;

pub use config::ProviderSettings;
pub use providers::GeminiClient;

/// Build the shared provider handle described by `settings`
pub fn build_provider(settings: &ProviderSettings) -> anyhow::Result<Arc<dyn TextProvider>> {
    let client = GeminiClient::from_settings(settings)?;
    tracing::info!(model = %client.model(), "Configured Gemini provider");
    Ok(Arc::new(client))
}
