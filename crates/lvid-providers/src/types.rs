//! Request/response types shared by the provider adapters.

use serde::{Deserialize, Serialize};

use lvid_models::{AspectRatio, CefrLevel, ProjectId, TemplateType, VideoSettings};

/// Input to content generation.
#[derive(Debug, Clone, Serialize)]
pub struct ContentRequest {
    pub template_type: TemplateType,
    pub topic: String,
    pub level: CefrLevel,
    pub target_duration_seconds: u32,
    pub native_language: String,
    /// Pre-gathered research context, prepended to the prompt when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_context: Option<String>,
}

/// Input to speech synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub script: String,
    pub voice_id: String,
}

/// Input to avatar-render submission.
#[derive(Debug, Clone, Serialize)]
pub struct AvatarRequest {
    pub audio_url: String,
    pub character_id: String,
    pub aspect_ratio: AspectRatio,
}

/// Input to final-compositing submission.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    pub project_id: ProjectId,
    pub settings: VideoSettings,
}

/// Handle to a long-running provider-side job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

/// State of a long-running provider-side job.
///
/// `NotFound` is terminal: the external worker may have restarted and lost
/// the job, so polling further cannot succeed.
#[derive(Debug, Clone)]
pub enum JobState<T> {
    Pending { progress_percent: Option<u8> },
    Complete(T),
    Failed { message: String },
    NotFound,
}

impl<T> JobState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, JobState::Pending { .. })
    }
}

/// Payload of a completed avatar render.
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarJobPayload {
    pub result_url: String,
}

/// Payload of a completed compositing job.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderJobPayload {
    pub result_url: String,
}
