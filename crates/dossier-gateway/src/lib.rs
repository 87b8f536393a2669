//! Dossier Gateway - HTTP transport for the report pipeline
//!
//! Exposes the two pipeline stages, the input normalizer and the markdown
//! renderer as JSON endpoints.
//!
//! # Routes
//!
//! ```text
//! GET  /                  greeting
//! GET  /health            liveness + version
//! POST /api/generate-md   { company }   -> stage 1 report
//! POST /api/analyze       { markdown }  -> stage 2 analysis (alias /api/gemini)
//! POST /api/normalize     { input }     -> { rule, record }
//! POST /api/render        { markdown }  -> RenderedBlocks
//! ```
//!
//! The gateway is stateless between requests: each call runs one stage
//! against the shared [`dossier_core::GenerationClient`].

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;

pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayState};

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default request body limit in bytes
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
