//! Dossier Core - two-stage report generation over an untyped text provider
//!
//! The pipeline takes free-form input describing a subject (usually a company
//! name), asks a text-generation provider for a structured markdown report,
//! then optionally asks it to analyze that report.
//!
//! # Architecture
//!
//! ```text
//! raw input ──> normalizer ──> prompts ──> generation ──> orchestrator (report)
//!                                                             │
//!                                     [user asks for analysis]│
//!                                                             v
//!                              prompts ──> generation ──> orchestrator (analysis) ──> render
//! ```
//!
//! 1. **Normalizer** (`normalizer`): best-effort key/value extraction from JSON, markdown or short text
//! 2. **Prompt Builder** (`prompts`): fixed templates with the provider output contract
//! 3. **Generation Client** (`generation`): injected provider handle with empty-response fallback
//! 4. **Stage Orchestrator** (`orchestrator`): ordered, stale-safe state machine over one run
//! 5. **Presentation Adapter** (`render`): markdown to display blocks
//!
//! # Quick Start
//!
//! ```
//! use dossier_core::normalizer::normalize;
//!
//! let record = normalize("### Acme\n**Industry:** Tech").unwrap();
//! assert_eq!(record.get("name"), Some("Acme"));
//! assert_eq!(record.get("industry"), Some("Tech"));
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod error;
pub mod generation;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod render;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DossierError, ProviderError, Result, ValidationError};
pub use generation::{GenerationClient, TextProvider, NO_CONTENT_FALLBACK};
pub use normalizer::{normalize, NormalizeRule, Normalized, Normalizer};
pub use orchestrator::{StageOrchestrator, SubmitOutcome};
pub use pipeline::{
    PipelineRun, PipelineSnapshot, PipelineState, Stage, StageResult, StageStatus,
};
pub use prompts::{build_analysis_prompt, build_report_prompt};
pub use render::{render, Block, ListItem, RenderedBlocks, Span};
pub use types::{CanonicalRecord, PipelineRequest, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
