//! Generated lesson content (the script-generation artifact).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured lesson content produced by the content-generation stage.
///
/// `objective`, `slides` and `full_script` are required for the lesson to be
/// usable downstream; the rest is enrichment the UI renders alongside the
/// video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LessonContent {
    /// What the learner should be able to do after the lesson
    pub objective: String,

    /// Vocabulary introduced in the lesson
    #[serde(default)]
    pub vocabulary: Vec<VocabularyItem>,

    /// Slide deck shown behind the avatar
    #[serde(default)]
    pub slides: Vec<Slide>,

    /// Comprehension questions
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,

    /// Key takeaways summarized at the end
    #[serde(default)]
    pub key_takeaways: Vec<String>,

    /// Complete narration script, the speech-synthesis input
    pub full_script: String,

    /// Provider's estimate of spoken duration
    #[serde(default)]
    pub estimated_duration_seconds: u32,
}

impl LessonContent {
    /// Check the three fields every downstream stage depends on.
    ///
    /// Returns the name of the first missing field, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.objective.trim().is_empty() {
            return Some("objective");
        }
        if self.slides.is_empty() {
            return Some("slides");
        }
        if self.full_script.trim().is_empty() {
            return Some("full_script");
        }
        None
    }
}

/// A single slide.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Slide {
    pub title: String,
    #[serde(default)]
    pub bullet_points: Vec<String>,
    /// Narration covering this slide
    #[serde(default)]
    pub narration: String,
}

/// A vocabulary entry with a native-language gloss.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VocabularyItem {
    pub word: String,
    pub definition: String,
    /// Translation into the learner's native language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_sentence: Option<String>,
}

/// A comprehension question.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuizQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
}
