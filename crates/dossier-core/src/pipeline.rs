//! Pipeline data model and the two stage operations.
//!
//! A run is the ordered pair of stage results: the GENERATED report and the
//! optional ANALYZED follow-up. Each stage is one provider call.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DossierError, ProviderError, ValidationError};
use crate::generation::GenerationClient;
use crate::prompts::{build_analysis_prompt, build_report_prompt};
use crate::types::{PipelineRequest, Timestamp};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Markdown report produced from user input
    Generated,
    /// Analysis produced from the report
    Analyzed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Generated => f.write_str("report"),
            Stage::Analyzed => f.write_str("analysis"),
        }
    }
}

/// Outcome of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Success,
    Failure,
}

/// Immutable result of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: Stage,
    pub content: String,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub completed_at: Timestamp,
}

impl StageResult {
    pub fn success(stage: Stage, content: impl Into<String>) -> Self {
        Self {
            stage,
            content: content.into(),
            status: StageStatus::Success,
            error_message: None,
            completed_at: Utc::now(),
        }
    }

    /// A failed stage keeps no content, only the user-facing message
    pub fn failure(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            content: String::new(),
            status: StageStatus::Failure,
            error_message: Some(message.into()),
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Success
    }

    /// Successful and carrying content a later stage can build on
    pub fn is_usable(&self) -> bool {
        self.is_success() && !self.content.trim().is_empty()
    }
}

/// Orchestrator state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    SubmittingStage1,
    Stage1Done,
    SubmittingStage2,
    Stage2Done,
    Error,
}

impl PipelineState {
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle | Stage1Done | Stage2Done | Error, SubmittingStage1) => true,
            (SubmittingStage1, Stage1Done | Error) => true,
            (Stage1Done | Stage2Done | Error, SubmittingStage2) => true,
            (SubmittingStage2, Stage2Done | Error) => true,
            _ => false,
        }
    }

    /// A provider call is in flight
    pub fn is_submitting(self) -> bool {
        matches!(
            self,
            PipelineState::SubmittingStage1 | PipelineState::SubmittingStage2
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "idle",
            PipelineState::SubmittingStage1 => "submitting report",
            PipelineState::Stage1Done => "report ready",
            PipelineState::SubmittingStage2 => "submitting analysis",
            PipelineState::Stage2Done => "analysis ready",
            PipelineState::Error => "in error",
        };
        f.write_str(label)
    }
}

/// One traversal of the pipeline from a submission until reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub subject: Option<String>,
    pub generated: Option<StageResult>,
    pub analyzed: Option<StageResult>,
}

impl PipelineRun {
    pub(crate) fn started(subject: &PipelineRequest) -> Self {
        Self {
            subject: Some(subject.subject().to_string()),
            generated: None,
            analyzed: None,
        }
    }

    /// Stage-1 content, when it may feed stage 2
    pub fn report_content(&self) -> Option<&str> {
        self.generated
            .as_ref()
            .filter(|r| r.is_usable())
            .map(|r| r.content.as_str())
    }

    /// The most recent successful stage output
    pub fn latest_output(&self) -> Option<&StageResult> {
        [self.analyzed.as_ref(), self.generated.as_ref()]
            .into_iter()
            .flatten()
            .find(|r| r.is_success())
    }
}

/// Read-only copy of orchestrator state handed to presentation code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub state: PipelineState,
    pub generation: u64,
    pub run: PipelineRun,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Stage 1: build the report prompt and call the provider.
pub async fn generate_report(
    client: &GenerationClient,
    request: &PipelineRequest,
) -> Result<String, ProviderError> {
    let prompt = build_report_prompt(request.subject());
    client.generate(&prompt).await
}

/// Stage 2: build the analysis prompt from a report and call the provider.
pub async fn analyze_report(
    client: &GenerationClient,
    report: &str,
) -> Result<String, DossierError> {
    if report.trim().is_empty() {
        return Err(ValidationError::EmptyContent.into());
    }
    let prompt = build_analysis_prompt(report);
    Ok(client.generate(&prompt).await?)
}
