//! Talking-avatar render adapter (submit + status).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::types::{AvatarJobPayload, AvatarRequest, JobHandle, JobState};

pub const AVATAR_PROVIDER: &str = "avatar";

/// Avatar rendering contract.
///
/// Renders are long-running: `submit` returns a job handle and `status` is
/// polled until the job reaches a terminal state.
#[async_trait]
pub trait AvatarRenderer: Send + Sync {
    async fn submit(&self, request: &AvatarRequest) -> ProviderResult<JobHandle>;

    async fn status(&self, handle: &JobHandle) -> ProviderResult<JobState<AvatarJobPayload>>;

    fn name(&self) -> &'static str {
        AVATAR_PROVIDER
    }
}

/// Configuration for the HTTP avatar renderer.
#[derive(Debug, Clone)]
pub struct AvatarProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for AvatarProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8020".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AvatarProviderConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("AVATAR_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("AVATAR_API_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("AVATAR_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

/// HTTP implementation of [`AvatarRenderer`].
pub struct HttpAvatarRenderer {
    http: Client,
    config: AvatarProviderConfig,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: String,
    #[serde(default)]
    result_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpAvatarRenderer {
    pub fn new(config: AvatarProviderConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::fatal(format!("avatar client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(AvatarProviderConfig::from_env())
    }
}

#[async_trait]
impl AvatarRenderer for HttpAvatarRenderer {
    async fn submit(&self, request: &AvatarRequest) -> ProviderResult<JobHandle> {
        let url = format!("{}/v1/videos", self.config.base_url);

        debug!(character_id = %request.character_id, "Submitting avatar render");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(AVATAR_PROVIDER, &e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(AVATAR_PROVIDER, status, &body));
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_output(format!("avatar submit malformed: {e}")))?;

        Ok(JobHandle::new(parsed.job_id))
    }

    async fn status(&self, handle: &JobHandle) -> ProviderResult<JobState<AvatarJobPayload>> {
        let url = format!("{}/v1/videos/{}", self.config.base_url, handle.job_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(AVATAR_PROVIDER, &e))?;

        // The render worker may have restarted and lost the job; that is a
        // terminal condition, not a transient one.
        if response.status().as_u16() == 404 {
            return Ok(JobState::NotFound);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(AVATAR_PROVIDER, status, &body));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_output(format!("avatar status malformed: {e}")))?;

        Ok(match parsed.state.as_str() {
            "pending" | "queued" | "processing" => JobState::Pending {
                progress_percent: None,
            },
            "complete" | "completed" | "done" => match parsed.result_url {
                Some(result_url) if !result_url.is_empty() => {
                    JobState::Complete(AvatarJobPayload { result_url })
                }
                _ => {
                    return Err(ProviderError::invalid_output(
                        "avatar job complete without result_url",
                    ))
                }
            },
            "failed" | "error" => JobState::Failed {
                message: parsed
                    .error
                    .unwrap_or_else(|| "avatar render failed".to_string()),
            },
            "not_found" => JobState::NotFound,
            other => {
                return Err(ProviderError::invalid_output(format!(
                    "avatar status unknown state: {other}"
                )))
            }
        })
    }
}
