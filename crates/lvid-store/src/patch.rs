//! Atomic project patches.

use chrono::Utc;

use lvid_models::{
    AudioOutput, AvatarOutput, FinalOutput, LessonContent, PipelineStage, ProjectStatus,
    VideoProject,
};

/// Error-field update carried by a patch.
#[derive(Debug, Clone, Default)]
pub enum ErrorPatch {
    /// Leave `error_message`/`error_step` unchanged
    #[default]
    Keep,
    /// Clear both fields (stage succeeded)
    Clear,
    /// Record a failure
    Set {
        step: PipelineStage,
        message: String,
    },
}

/// A partial update applied atomically by [`crate::ProjectStore::patch`].
///
/// Unset fields are left untouched. `expected_status` is the optimistic
/// guard: when present, the patch only applies if the stored status still
/// matches.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub expected_status: Option<ProjectStatus>,
    pub status: Option<ProjectStatus>,
    pub lesson_content: Option<LessonContent>,
    pub audio_output: Option<AudioOutput>,
    pub avatar_output: Option<AvatarOutput>,
    pub final_output: Option<FinalOutput>,
    pub error: ErrorPatch,
}

impl ProjectPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard the patch on the stored status still being `status`.
    pub fn expect_status(mut self, status: ProjectStatus) -> Self {
        self.expected_status = Some(status);
        self
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_lesson_content(mut self, content: LessonContent) -> Self {
        self.lesson_content = Some(content);
        self
    }

    pub fn with_audio_output(mut self, audio: AudioOutput) -> Self {
        self.audio_output = Some(audio);
        self
    }

    pub fn with_avatar_output(mut self, avatar: AvatarOutput) -> Self {
        self.avatar_output = Some(avatar);
        self
    }

    pub fn with_final_output(mut self, output: FinalOutput) -> Self {
        self.final_output = Some(output);
        self
    }

    /// Record a stage failure.
    pub fn with_error(mut self, step: PipelineStage, message: impl Into<String>) -> Self {
        self.error = ErrorPatch::Set {
            step,
            message: message.into(),
        };
        self
    }

    /// Clear any prior failure detail.
    pub fn clear_error(mut self) -> Self {
        self.error = ErrorPatch::Clear;
        self
    }

    /// Apply the patch in place, bumping `updated_at`.
    ///
    /// The guard is checked by the store before this is called.
    pub fn apply(self, project: &mut VideoProject) {
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(content) = self.lesson_content {
            project.lesson_content = Some(content);
        }
        if let Some(audio) = self.audio_output {
            project.audio_output = Some(audio);
        }
        if let Some(avatar) = self.avatar_output {
            project.avatar_output = Some(avatar);
        }
        if let Some(output) = self.final_output {
            project.final_output = Some(output);
        }
        match self.error {
            ErrorPatch::Keep => {}
            ErrorPatch::Clear => {
                project.error_message = None;
                project.error_step = None;
            }
            ErrorPatch::Set { step, message } => {
                project.error_step = Some(step);
                project.error_message = Some(message);
            }
        }
        project.updated_at = Utc::now();
    }
}
