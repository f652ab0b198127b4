//! Shared data models for the LessonVid backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video projects and their per-stage artifacts
//! - The pipeline status state machine
//! - Generated lesson content (script, slides, vocabulary)
//! - Source, voice, avatar and video settings

pub mod lesson;
pub mod project;
pub mod settings;
pub mod status;

// Re-export common types
pub use lesson::{LessonContent, QuizQuestion, Slide, VocabularyItem};
pub use project::{AudioOutput, AvatarOutput, FinalOutput, ProjectId, VideoProject};
pub use settings::{
    AspectRatio, AvatarConfig, CefrLevel, SourceConfig, SourceMode, TemplateType, VideoSettings,
    VoiceConfig,
};
pub use status::{PipelineStage, ProjectStatus};
