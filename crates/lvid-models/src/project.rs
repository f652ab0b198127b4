//! Video project model and per-stage artifacts.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lesson::LessonContent;
use crate::settings::{AvatarConfig, SourceConfig, TemplateType, VideoSettings, VoiceConfig};
use crate::status::{PipelineStage, ProjectStatus};

/// Unique identifier for a video project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Speech-synthesis artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AudioOutput {
    /// URL of the synthesized audio
    pub url: String,
    /// Spoken duration in seconds
    pub duration_seconds: f64,
}

/// Avatar-render artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AvatarOutput {
    /// URL of the rendered avatar video
    pub url: String,
    /// Provider-side job ID the render was tracked under
    pub provider_job_id: String,
}

/// Final compositing artifact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FinalOutput {
    /// URL of the finished video
    pub url: String,
}

/// One video being produced.
///
/// Created in `draft` by the UI and mutated exclusively by the stage
/// orchestrator; the pipeline never deletes projects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoProject {
    pub id: ProjectId,
    pub title: String,
    pub template_type: TemplateType,
    pub source_config: SourceConfig,
    pub voice_config: VoiceConfig,
    pub avatar_config: AvatarConfig,
    pub video_settings: VideoSettings,

    /// Current pipeline state
    #[serde(default)]
    pub status: ProjectStatus,

    /// Stage 1 artifact (script); stage 2 input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_content: Option<LessonContent>,

    /// Stage 2 artifact (audio); stage 3 input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_output: Option<AudioOutput>,

    /// Stage 3 artifact (avatar video); stage 4 input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_output: Option<AvatarOutput>,

    /// Terminal artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_output: Option<FinalOutput>,

    /// Error detail, set only while `status == failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Stage that failed, set only while `status == failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_step: Option<PipelineStage>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoProject {
    /// Create a new draft project.
    pub fn new(
        title: impl Into<String>,
        template_type: TemplateType,
        source_config: SourceConfig,
        voice_config: VoiceConfig,
        avatar_config: AvatarConfig,
        video_settings: VideoSettings,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            title: title.into(),
            template_type,
            source_config,
            voice_config,
            avatar_config,
            video_settings,
            status: ProjectStatus::Draft,
            lesson_content: None,
            audio_output: None,
            avatar_output: None,
            final_output: None,
            error_message: None,
            error_step: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stage this project may legally enter next.
    ///
    /// Forward transitions are monotonic; out of `failed` only the stage
    /// recorded in `error_step` is re-entrant.
    pub fn admissible_stage(&self) -> Option<PipelineStage> {
        match self.status {
            ProjectStatus::Failed => self.error_step,
            _ => self.status.next_stage(),
        }
    }

    /// Check that the artifact a stage consumes is present and usable.
    ///
    /// Returns a description of what is missing, or `None` when the stage
    /// can run.
    pub fn missing_prerequisite(&self, stage: PipelineStage) -> Option<&'static str> {
        match stage {
            PipelineStage::ContentGeneration => {
                if self.source_config.topic.trim().is_empty() {
                    Some("source_config.topic")
                } else {
                    None
                }
            }
            PipelineStage::AudioGeneration => match &self.lesson_content {
                Some(content) if !content.full_script.trim().is_empty() => None,
                _ => Some("lesson_content.full_script"),
            },
            PipelineStage::AvatarGeneration => match &self.audio_output {
                Some(audio) if !audio.url.is_empty() => None,
                _ => Some("audio_output.url"),
            },
            PipelineStage::Rendering => match &self.avatar_output {
                Some(avatar) if !avatar.url.is_empty() => None,
                _ => Some("avatar_output.url"),
            },
        }
    }
}
