//! Content-generation adapter.
//!
//! Wraps an OpenAI-compatible chat-completions API behind the
//! [`ContentGenerator`] trait. A configurable model fallback chain is tried
//! in order, first success wins; the response is parsed as JSON (stripping
//! markdown code fences some models wrap around it) and validated for the
//! three fields every downstream stage depends on.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use lvid_models::LessonContent;

use crate::error::{ProviderError, ProviderResult};
use crate::types::ContentRequest;

/// Provider name used for spacing and logging.
pub const CONTENT_PROVIDER: &str = "content";

/// Content generation contract.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate lesson content for a topic/level.
    ///
    /// Implementations must validate the output shape before returning it;
    /// a structurally incomplete lesson is an `InvalidOutputShape` error,
    /// never a success.
    async fn generate(&self, request: &ContentRequest) -> ProviderResult<LessonContent>;

    /// Provider name for spacing and logging.
    fn name(&self) -> &'static str {
        CONTENT_PROVIDER
    }
}

/// Configuration for the HTTP content generator.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Base URL of the chat-completions API
    pub base_url: String,
    pub api_key: String,
    /// Model fallback chain, tried in order
    pub models: Vec<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            models: vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
            timeout: Duration::from_secs(120),
        }
    }
}

impl ContentConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("CONTENT_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("CONTENT_API_KEY").unwrap_or_default(),
            models: std::env::var("CONTENT_MODELS")
                .map(|s| s.split(',').map(|m| m.trim().to_string()).collect())
                .unwrap_or(defaults.models),
            timeout: Duration::from_secs(
                std::env::var("CONTENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }
}

/// HTTP implementation of [`ContentGenerator`].
pub struct HttpContentGenerator {
    http: Client,
    config: ContentConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl HttpContentGenerator {
    pub fn new(config: ContentConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::fatal(format!("content client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ContentConfig::from_env())
    }

    async fn call_model(&self, model: &str, prompt: String) -> ProviderResult<LessonContent> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        debug!(model = %model, "Sending content generation request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(CONTENT_PROVIDER, &e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(CONTENT_PROVIDER, status, &body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::fatal(format!("content response not JSON: {e}")))?;

        let text = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ProviderError::fatal("content response has no choices"))?;

        parse_lesson_content(text)
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate(&self, request: &ContentRequest) -> ProviderResult<LessonContent> {
        let prompt = build_lesson_prompt(request);
        let mut last_error = None;

        for model in &self.config.models {
            match self.call_model(model, prompt.clone()).await {
                Ok(content) => {
                    info!(model = %model, "Generated lesson content");
                    return Ok(content);
                }
                Err(e) => {
                    warn!(model = %model, "Content generation failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::fatal("no content models configured")))
    }
}

/// Parse a model's text output into validated lesson content.
pub fn parse_lesson_content(text: &str) -> ProviderResult<LessonContent> {
    let text = strip_code_fences(text);

    let content: LessonContent = serde_json::from_str(text)
        .map_err(|e| ProviderError::invalid_output(format!("lesson JSON parse failed: {e}")))?;

    if let Some(field) = content.missing_required_field() {
        return Err(ProviderError::invalid_output(format!(
            "lesson content missing required field: {field}"
        )));
    }

    Ok(content)
}

/// Strip a markdown ```json fence some models wrap JSON output in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

const SYSTEM_PROMPT: &str = "You are an experienced language teacher producing \
scripts for short educational videos. Always answer with a single JSON object \
and nothing else.";

/// Build the lesson prompt for a content request.
pub fn build_lesson_prompt(request: &ContentRequest) -> String {
    let mut prompt = String::new();

    if let Some(ref context) = request.research_context {
        prompt.push_str("REFERENCE MATERIAL (use for facts, do not quote verbatim):\n");
        prompt.push_str(context);
        prompt.push_str("\n\n");
    }

    let template_instruction = match request.template_type {
        lvid_models::TemplateType::GrammarLesson => {
            "Teach one grammar point with clear rules and example sentences."
        }
        lvid_models::TemplateType::NewsBroadcast => {
            "Present the topic as a short news broadcast with level-appropriate language."
        }
        lvid_models::TemplateType::VocabularyLesson => {
            "Teach the topic's core vocabulary with definitions and example usage."
        }
        lvid_models::TemplateType::ConversationPractice => {
            "Build a realistic dialogue learners can follow and repeat."
        }
    };

    prompt.push_str(&format!(
        r#"Create a {template} video lesson.

Topic: {topic}
Learner level (CEFR): {level}
Learner's native language: {native}
Target spoken duration: {duration} seconds

{instruction}

Return ONLY a JSON object with this schema:
{{
  "objective": "What the learner will be able to do",
  "vocabulary": [{{"word": "", "definition": "", "translation": "", "example_sentence": ""}}],
  "slides": [{{"title": "", "bullet_points": [""], "narration": ""}}],
  "questions": [{{"question": "", "options": [""], "correct_answer": ""}}],
  "key_takeaways": [""],
  "full_script": "The complete narration script",
  "estimated_duration_seconds": {duration}
}}"#,
        template = request.template_type,
        topic = request.topic,
        level = request.level,
        native = request.native_language,
        duration = request.target_duration_seconds,
        instruction = template_instruction,
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    use lvid_models::{CefrLevel, TemplateType};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ContentRequest {
        ContentRequest {
            template_type: TemplateType::GrammarLesson,
            topic: "past perfect".to_string(),
            level: CefrLevel::B1,
            target_duration_seconds: 300,
            native_language: "Spanish".to_string(),
            research_context: None,
        }
    }

    fn lesson_json() -> String {
        serde_json::json!({
            "objective": "x",
            "slides": [{"title": "t", "bullet_points": [], "narration": ""}],
            "full_script": "y"
        })
        .to_string()
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    async fn generator_for(server: &MockServer, models: &[&str]) -> HttpContentGenerator {
        HttpContentGenerator::new(ContentConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_rejects_incomplete_lesson() {
        let err = parse_lesson_content(r#"{"objective": "x", "full_script": "", "slides": []}"#)
            .unwrap_err();
        assert!(err.is_invalid_output());
    }

    #[test]
    fn test_prompt_includes_research_context() {
        let mut req = request();
        req.research_context = Some("The moon is made of rock.".to_string());
        let prompt = build_lesson_prompt(&req);
        assert!(prompt.starts_with("REFERENCE MATERIAL"));
        assert!(prompt.contains("past perfect"));
        assert!(prompt.contains("B1"));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&lesson_json())))
            .mount(&server)
            .await;

        let generator = generator_for(&server, &["model-a"]).await;
        let content = generator.generate(&request()).await.unwrap();
        assert_eq!(content.objective, "x");
    }

    #[tokio::test]
    async fn test_generate_strips_fences() {
        let server = MockServer::start().await;
        let fenced = format!("```json\n{}\n```", lesson_json());
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&fenced)))
            .mount(&server)
            .await;

        let generator = generator_for(&server, &["model-a"]).await;
        assert!(generator.generate(&request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_generate_falls_back_across_models() {
        let server = MockServer::start().await;
        // First model always 500s; second succeeds. The adapter sends the
        // model name in the body, but wiremock matching on body fields is
        // order-dependent here, so assert on call count instead.
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&lesson_json())))
            .mount(&server)
            .await;

        let generator = generator_for(&server, &["model-a", "model-b"]).await;
        let content = generator.generate(&request()).await.unwrap();
        assert_eq!(content.full_script, "y");
    }

    #[tokio::test]
    async fn test_generate_surfaces_last_error_when_all_fail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let generator = generator_for(&server, &["model-a", "model-b"]).await;
        let err = generator.generate(&request()).await.unwrap_err();
        assert!(!err.is_retryable());
        assert_eq!(err.http_status, Some(400));
    }
}
