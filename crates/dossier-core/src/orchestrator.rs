//! Stage Orchestrator
//!
//! Owns the current [`PipelineRun`] and drives it through
//!
//! ```text
//! IDLE ──submit──> SUBMITTING_STAGE1 ──ok──> STAGE1_DONE ──analyze──> SUBMITTING_STAGE2 ──ok──> STAGE2_DONE
//!                        │                                                   │
//!                        └────────err────────> ERROR <────────err────────────┘
//! ```
//!
//! `reset()` returns to IDLE from anywhere. At most one provider call is in
//! flight per run; a submission while one is pending is ignored. Every call is
//! tagged with the run generation it started in, and a response whose
//! generation no longer matches (because of a reset or resubmission) is
//! dropped without touching state.
//!
//! The state lock is never held across a provider call. A submission whose
//! future is dropped mid-call moves its run to ERROR, keeping any stage-1
//! content, so later submissions are not blocked.

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{DossierError, Result};
use crate::generation::GenerationClient;
use crate::pipeline::{
    analyze_report, generate_report, PipelineRun, PipelineSnapshot, PipelineState, Stage,
    StageResult,
};
use crate::types::PipelineRequest;

/// What happened to a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The stage finished and its result was stored
    Completed(StageResult),
    /// Another call was already in flight; nothing was done
    Ignored,
    /// The run was reset or replaced while the call was in flight
    Superseded,
}

impl SubmitOutcome {
    pub fn result(&self) -> Option<&StageResult> {
        match self {
            SubmitOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }
}

/// Error recorded when a submission is dropped before its call returns
pub const CANCELLED_MESSAGE: &str = "Request was cancelled. Please try again.";

#[derive(Debug)]
struct Inner {
    state: PipelineState,
    generation: u64,
    run: PipelineRun,
    error: Option<String>,
}

impl Inner {
    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(from = ?self.state, to = ?next, generation = self.generation, "Pipeline transition");
        self.state = next;
    }
}

/// Marks the run as failed if dropped while its call is still pending
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    generation: u64,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(inner: &'a Mutex<Inner>, generation: u64) -> Self {
        Self {
            inner,
            generation,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.generation == self.generation && inner.state.is_submitting() {
            tracing::warn!(generation = self.generation, state = ?inner.state, "Submission dropped mid-call");
            inner.error = Some(CANCELLED_MESSAGE.to_string());
            inner.transition(PipelineState::Error);
        }
    }
}

/// Two-stage generate -> analyze workflow
#[derive(Debug)]
pub struct StageOrchestrator {
    client: GenerationClient,
    inner: Mutex<Inner>,
}

impl StageOrchestrator {
    pub fn new(client: GenerationClient) -> Self {
        Self {
            client,
            inner: Mutex::new(Inner {
                state: PipelineState::Idle,
                generation: 0,
                run: PipelineRun::default(),
                error: None,
            }),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.inner.lock().state
    }

    /// Current run generation. Bumped by every submission and reset.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let inner = self.inner.lock();
        PipelineSnapshot {
            state: inner.state,
            generation: inner.generation,
            run: inner.run.clone(),
            error: inner.error.clone(),
        }
    }

    /// Start a fresh run with stage 1.
    ///
    /// Rejected without a provider call when the subject is blank. Any
    /// previous run is discarded.
    pub async fn submit(&self, subject: &str) -> Result<SubmitOutcome> {
        let (request, generation) = {
            let mut inner = self.inner.lock();
            if inner.state.is_submitting() {
                tracing::debug!(state = ?inner.state, "Submission ignored, call in flight");
                return Ok(SubmitOutcome::Ignored);
            }

            let request = match PipelineRequest::new(subject) {
                Ok(request) => request,
                Err(e) => {
                    inner.error = Some(e.to_string());
                    return Err(e.into());
                }
            };

            inner.generation += 1;
            inner.run = PipelineRun::started(&request);
            inner.error = None;
            inner.transition(PipelineState::SubmittingStage1);
            (request, inner.generation)
        };

        tracing::info!(subject = %request, generation, "Generating report");
        let mut in_flight = InFlight::new(&self.inner, generation);
        let outcome = generate_report(&self.client, &request).await;
        in_flight.disarm();

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::warn!(
                generation,
                current = inner.generation,
                "Discarding stale report response"
            );
            return Ok(SubmitOutcome::Superseded);
        }

        let result = match outcome {
            Ok(content) => {
                inner.transition(PipelineState::Stage1Done);
                StageResult::success(Stage::Generated, content)
            }
            Err(e) => {
                let message = e.public_message().to_string();
                inner.error = Some(message.clone());
                inner.transition(PipelineState::Error);
                StageResult::failure(Stage::Generated, message)
            }
        };
        inner.run.generated = Some(result.clone());
        Ok(SubmitOutcome::Completed(result))
    }

    /// Run stage 2 on the stored stage-1 content.
    ///
    /// Allowed once stage 1 succeeded with non-empty content, including after
    /// a stage-2 failure. The stage-1 content is used exactly as stored.
    pub async fn submit_analysis(&self) -> Result<SubmitOutcome> {
        let (report, generation) = {
            let mut inner = self.inner.lock();
            if inner.state.is_submitting() {
                tracing::debug!(state = ?inner.state, "Analysis ignored, call in flight");
                return Ok(SubmitOutcome::Ignored);
            }

            let report = match inner.run.report_content() {
                Some(report) if inner.state.can_transition_to(PipelineState::SubmittingStage2) => {
                    report.to_string()
                }
                _ => {
                    return Err(DossierError::InvalidTransition {
                        from: inner.state.to_string(),
                        action: "analyze".to_string(),
                    })
                }
            };

            inner.error = None;
            inner.transition(PipelineState::SubmittingStage2);
            (report, inner.generation)
        };

        tracing::info!(generation, report_len = report.len(), "Analyzing report");
        let mut in_flight = InFlight::new(&self.inner, generation);
        let outcome = analyze_report(&self.client, &report).await;
        in_flight.disarm();

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::warn!(
                generation,
                current = inner.generation,
                "Discarding stale analysis response"
            );
            return Ok(SubmitOutcome::Superseded);
        }

        let result = match outcome {
            Ok(content) => {
                inner.transition(PipelineState::Stage2Done);
                StageResult::success(Stage::Analyzed, content)
            }
            Err(e) => {
                let message = e.user_message();
                inner.error = Some(message.clone());
                inner.transition(PipelineState::Error);
                StageResult::failure(Stage::Analyzed, message)
            }
        };
        inner.run.analyzed = Some(result.clone());
        Ok(SubmitOutcome::Completed(result))
    }

    /// Discard both stage results and return to IDLE.
    ///
    /// An in-flight call is not aborted; its response will be dropped.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.run = PipelineRun::default();
        inner.error = None;
        inner.transition(PipelineState::Idle);
        tracing::info!(generation = inner.generation, "Pipeline reset");
    }

    /// Clear the error message, keeping every stage result.
    pub fn dismiss_error(&self) {
        self.inner.lock().error = None;
    }
}
