//! Pipeline error taxonomy.
//!
//! Every public pipeline operation returns a typed result; no error crosses
//! the orchestrator boundary as a panic. The kinds map to distinct user
//! guidance (wait / retry / wait longer / report a bug), which
//! [`PipelineError::user_message`] renders.

use thiserror::Error;

use lvid_models::{PipelineStage, ProjectStatus};
use lvid_providers::ProviderError;
use lvid_store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid transition: {from} cannot enter {to}")]
    InvalidTransition {
        from: ProjectStatus,
        to: PipelineStage,
    },

    #[error("Missing prerequisite for {stage}: {field}")]
    MissingPrerequisite {
        stage: PipelineStage,
        field: &'static str,
    },

    #[error("Pipeline busy: another stage is in flight")]
    Busy,

    #[error("{stage} timed out after {attempts} polls")]
    Timeout {
        stage: PipelineStage,
        attempts: u32,
    },

    #[error("Provider lost track of job {job_id}")]
    JobNotFound { job_id: String },

    #[error("Provider job failed: {message}")]
    JobFailed { message: String },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub fn invalid_transition(from: ProjectStatus, to: PipelineStage) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn missing_prerequisite(stage: PipelineStage, field: &'static str) -> Self {
        Self::MissingPrerequisite { stage, field }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, PipelineError::Busy)
    }

    /// Guidance for the UI; the corrective action differs per kind.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Busy => {
                "Another generation step is already running. Try again in a moment.".to_string()
            }
            PipelineError::Timeout { stage, .. } => format!(
                "The {stage} step is taking longer than expected. Wait a bit and retry the step."
            ),
            PipelineError::JobNotFound { .. } => {
                "The provider lost track of this job. Retry the step to resubmit it.".to_string()
            }
            PipelineError::Provider(e) if e.is_invalid_output() => {
                "The AI returned incomplete content. Retry the step; if this keeps happening, report it.".to_string()
            }
            PipelineError::Provider(e) if e.is_retryable() => {
                "The provider is temporarily unavailable. Retry the step shortly.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_predicate() {
        assert!(PipelineError::Busy.is_busy());
        assert!(!PipelineError::JobFailed {
            message: "x".to_string()
        }
        .is_busy());
    }

    #[test]
    fn test_user_messages_are_distinct() {
        let busy = PipelineError::Busy.user_message();
        let timeout = PipelineError::Timeout {
            stage: PipelineStage::Rendering,
            attempts: 120,
        }
        .user_message();
        let malformed =
            PipelineError::Provider(ProviderError::invalid_output("missing slides")).user_message();
        let throttled =
            PipelineError::Provider(ProviderError::retryable("429")).user_message();

        let all = [&busy, &timeout, &malformed, &throttled];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
