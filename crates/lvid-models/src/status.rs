//! Pipeline status state machine.
//!
//! A project moves through four stages, each with a `*_generating` state
//! while provider work is in flight and a `*_ready` state once the artifact
//! is persisted. `failed` is reachable from every in-flight state and is
//! re-entrant only into the stage that failed.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One of the four pipeline phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Script generation (topic/level → lesson content)
    ContentGeneration,
    /// Speech synthesis (script → audio)
    AudioGeneration,
    /// Talking-avatar rendering (audio → avatar video)
    AvatarGeneration,
    /// Final video compositing
    Rendering,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::ContentGeneration => "content_generation",
            PipelineStage::AudioGeneration => "audio_generation",
            PipelineStage::AvatarGeneration => "avatar_generation",
            PipelineStage::Rendering => "rendering",
        }
    }

    /// Status a project holds while this stage's provider work is in flight.
    pub fn generating_status(&self) -> ProjectStatus {
        match self {
            PipelineStage::ContentGeneration => ProjectStatus::ContentGenerating,
            PipelineStage::AudioGeneration => ProjectStatus::AudioGenerating,
            PipelineStage::AvatarGeneration => ProjectStatus::AvatarGenerating,
            PipelineStage::Rendering => ProjectStatus::Rendering,
        }
    }

    /// Status a project reaches once this stage's artifact is persisted.
    ///
    /// The rendering stage has no `_ready` state; its success is `completed`.
    pub fn ready_status(&self) -> ProjectStatus {
        match self {
            PipelineStage::ContentGeneration => ProjectStatus::ContentReady,
            PipelineStage::AudioGeneration => ProjectStatus::AudioReady,
            PipelineStage::AvatarGeneration => ProjectStatus::AvatarReady,
            PipelineStage::Rendering => ProjectStatus::Completed,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project pipeline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created by the UI, no pipeline work started
    #[default]
    Draft,
    /// Script generation in flight
    ContentGenerating,
    /// Lesson content persisted
    ContentReady,
    /// Speech synthesis in flight
    AudioGenerating,
    /// Audio artifact persisted
    AudioReady,
    /// Avatar render job in flight
    AvatarGenerating,
    /// Avatar video persisted
    AvatarReady,
    /// Final compositing job in flight
    Rendering,
    /// Final video persisted
    Completed,
    /// A stage failed; `error_step` names it
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::ContentGenerating => "content_generating",
            ProjectStatus::ContentReady => "content_ready",
            ProjectStatus::AudioGenerating => "audio_generating",
            ProjectStatus::AudioReady => "audio_ready",
            ProjectStatus::AvatarGenerating => "avatar_generating",
            ProjectStatus::AvatarReady => "avatar_ready",
            ProjectStatus::Rendering => "rendering",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    /// The only stage a project in this status may legally enter next.
    ///
    /// Returns `None` for in-flight, failed and terminal states; retry out of
    /// `failed` is governed by the project's `error_step`, not by status.
    pub fn next_stage(&self) -> Option<PipelineStage> {
        match self {
            ProjectStatus::Draft => Some(PipelineStage::ContentGeneration),
            ProjectStatus::ContentReady => Some(PipelineStage::AudioGeneration),
            ProjectStatus::AudioReady => Some(PipelineStage::AvatarGeneration),
            ProjectStatus::AvatarReady => Some(PipelineStage::Rendering),
            _ => None,
        }
    }

    /// Stage whose provider work is currently in flight, if any.
    pub fn in_flight_stage(&self) -> Option<PipelineStage> {
        match self {
            ProjectStatus::ContentGenerating => Some(PipelineStage::ContentGeneration),
            ProjectStatus::AudioGenerating => Some(PipelineStage::AudioGeneration),
            ProjectStatus::AvatarGenerating => Some(PipelineStage::AvatarGeneration),
            ProjectStatus::Rendering => Some(PipelineStage::Rendering),
            _ => None,
        }
    }

    /// Check if this is a terminal success state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed)
    }

    /// Check if provider work is in flight.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight_stage().is_some()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_chain_is_complete() {
        let mut status = ProjectStatus::Draft;
        let mut visited = vec![status];

        while let Some(stage) = status.next_stage() {
            let generating = stage.generating_status();
            assert_eq!(generating.in_flight_stage(), Some(stage));
            status = stage.ready_status();
            visited.push(generating);
            visited.push(status);
        }

        assert_eq!(status, ProjectStatus::Completed);
        assert_eq!(visited.len(), 9);
    }

    #[test]
    fn test_in_flight_states_have_no_successor() {
        for status in [
            ProjectStatus::ContentGenerating,
            ProjectStatus::AudioGenerating,
            ProjectStatus::AvatarGenerating,
            ProjectStatus::Rendering,
            ProjectStatus::Completed,
            ProjectStatus::Failed,
        ] {
            assert!(status.next_stage().is_none(), "{status} has a successor");
        }
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&PipelineStage::ContentGeneration).unwrap();
        assert_eq!(json, "\"content_generation\"");

        let json = serde_json::to_string(&ProjectStatus::AvatarGenerating).unwrap();
        assert_eq!(json, "\"avatar_generating\"");
    }
}
