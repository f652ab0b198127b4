//! Speech-synthesis adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use lvid_models::AudioOutput;

use crate::error::{ProviderError, ProviderResult};
use crate::types::SpeechRequest;

pub const SPEECH_PROVIDER: &str = "speech";

/// Speech synthesis contract.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize a narration script into hosted audio.
    async fn synthesize(&self, request: &SpeechRequest) -> ProviderResult<AudioOutput>;

    fn name(&self) -> &'static str {
        SPEECH_PROVIDER
    }
}

/// Configuration for the HTTP speech synthesizer.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8010".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(180),
        }
    }
}

impl SpeechConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SPEECH_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("SPEECH_API_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("SPEECH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(180),
            ),
        }
    }
}

/// HTTP implementation of [`SpeechSynthesizer`].
pub struct HttpSpeechSynthesizer {
    http: Client,
    config: SpeechConfig,
}

#[derive(Debug, Deserialize)]
struct SynthesizeResponse {
    audio_url: String,
    duration_seconds: f64,
}

impl HttpSpeechSynthesizer {
    pub fn new(config: SpeechConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::fatal(format!("speech client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(SpeechConfig::from_env())
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, request: &SpeechRequest) -> ProviderResult<AudioOutput> {
        let url = format!("{}/v1/synthesize", self.config.base_url);

        debug!(voice_id = %request.voice_id, "Submitting speech synthesis");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(SPEECH_PROVIDER, &e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(SPEECH_PROVIDER, status, &body));
        }

        let parsed: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_output(format!("speech response malformed: {e}")))?;

        if parsed.audio_url.is_empty() {
            return Err(ProviderError::invalid_output(
                "speech response missing audio_url",
            ));
        }

        Ok(AudioOutput {
            url: parsed.audio_url,
            duration_seconds: parsed.duration_seconds,
        })
    }
}
