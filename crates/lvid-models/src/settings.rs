//! Project configuration: source material, voice, avatar and video settings.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lesson template driving script structure and tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    #[default]
    GrammarLesson,
    NewsBroadcast,
    VocabularyLesson,
    ConversationPractice,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::GrammarLesson => "grammar_lesson",
            TemplateType::NewsBroadcast => "news_broadcast",
            TemplateType::VocabularyLesson => "vocabulary_lesson",
            TemplateType::ConversationPractice => "conversation_practice",
        }
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// CEFR learner proficiency level used to parameterize content generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
pub enum CefrLevel {
    A1,
    #[default]
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the source material for a lesson is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Generate purely from the topic
    #[default]
    Topic,
    /// Generate from caller-supplied reference URLs
    Urls,
    /// Topic plus reference URLs
    Mixed,
}

/// Source material configuration for content generation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SourceConfig {
    /// Lesson topic (e.g. "past perfect tense", "climate news this week")
    pub topic: String,
    /// Learner proficiency level
    #[serde(default)]
    pub level: CefrLevel,
    /// Target video duration in seconds
    pub target_duration_seconds: u32,
    /// Learner's native language (for translations and hints)
    pub native_language: String,
    /// Reference URLs to ground the lesson in (at most 3 are fetched)
    #[serde(default)]
    pub urls: Vec<String>,
    /// How the source material is combined
    #[serde(default)]
    pub mode: SourceMode,
}

/// Voice used for speech synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VoiceConfig {
    /// Provider name (as registered with the request spacer)
    pub provider: String,
    /// Provider-side voice identifier
    pub voice_id: String,
    /// Human-readable voice name
    pub voice_name: String,
}

/// Avatar character used for the talking-head render.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AvatarConfig {
    /// Provider name
    pub provider: String,
    /// Provider-side character identifier
    pub character_id: String,
    /// Human-readable character name
    pub character_name: String,
}

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum AspectRatio {
    /// Landscape (YouTube)
    #[serde(rename = "16:9")]
    #[default]
    Landscape,
    /// Portrait (Shorts/Reels)
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final video composition settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoSettings {
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    /// Output resolution (e.g. "1920x1080")
    pub resolution: String,
    #[serde(default)]
    pub include_intro: bool,
    #[serde(default)]
    pub include_outro: bool,
    /// Lower-third caption text, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_third: Option<String>,
    #[serde(default)]
    pub include_progress_bar: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::Landscape,
            resolution: "1920x1080".to_string(),
            include_intro: true,
            include_outro: true,
            lower_third: None,
            include_progress_bar: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_serialization() {
        assert_eq!(serde_json::to_string(&AspectRatio::Landscape).unwrap(), "\"16:9\"");
        assert_eq!(serde_json::to_string(&AspectRatio::Portrait).unwrap(), "\"9:16\"");

        let parsed: AspectRatio = serde_json::from_str("\"9:16\"").unwrap();
        assert_eq!(parsed, AspectRatio::Portrait);
    }

    #[test]
    fn test_template_type_round_trip() {
        let json = serde_json::to_string(&TemplateType::NewsBroadcast).unwrap();
        assert_eq!(json, "\"news_broadcast\"");
        let parsed: TemplateType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TemplateType::NewsBroadcast);
    }
}
