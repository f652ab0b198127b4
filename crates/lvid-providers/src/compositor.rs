//! Final video compositing adapter (submit + status).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::types::{JobHandle, JobState, RenderJobPayload, RenderRequest};

pub const RENDER_PROVIDER: &str = "render";

/// Video compositing contract.
#[async_trait]
pub trait VideoCompositor: Send + Sync {
    async fn submit(&self, request: &RenderRequest) -> ProviderResult<JobHandle>;

    async fn status(&self, handle: &JobHandle) -> ProviderResult<JobState<RenderJobPayload>>;

    fn name(&self) -> &'static str {
        RENDER_PROVIDER
    }
}

/// Configuration for the HTTP compositor client.
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8030".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl CompositorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("RENDER_API_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("RENDER_API_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

/// HTTP implementation of [`VideoCompositor`].
pub struct HttpVideoCompositor {
    http: Client,
    config: CompositorConfig,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    state: String,
    #[serde(default)]
    progress_percent: Option<u8>,
    #[serde(default)]
    result_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpVideoCompositor {
    pub fn new(config: CompositorConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::fatal(format!("render client build failed: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ProviderResult<Self> {
        Self::new(CompositorConfig::from_env())
    }
}

#[async_trait]
impl VideoCompositor for HttpVideoCompositor {
    async fn submit(&self, request: &RenderRequest) -> ProviderResult<JobHandle> {
        let url = format!("{}/v1/render", self.config.base_url);

        debug!(project_id = %request.project_id, "Submitting compositing job");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(RENDER_PROVIDER, &e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(RENDER_PROVIDER, status, &body));
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_output(format!("render submit malformed: {e}")))?;

        Ok(JobHandle::new(parsed.job_id))
    }

    async fn status(&self, handle: &JobHandle) -> ProviderResult<JobState<RenderJobPayload>> {
        let url = format!("{}/v1/render/{}", self.config.base_url, handle.job_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(RENDER_PROVIDER, &e))?;

        if response.status().as_u16() == 404 {
            return Ok(JobState::NotFound);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(RENDER_PROVIDER, status, &body));
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::invalid_output(format!("render status malformed: {e}")))?;

        Ok(match parsed.state.as_str() {
            "pending" | "queued" | "processing" | "rendering" => JobState::Pending {
                progress_percent: parsed.progress_percent,
            },
            "complete" | "completed" | "done" => match parsed.result_url {
                Some(result_url) if !result_url.is_empty() => {
                    JobState::Complete(RenderJobPayload { result_url })
                }
                _ => {
                    return Err(ProviderError::invalid_output(
                        "render job complete without result_url",
                    ))
                }
            },
            "failed" | "error" => JobState::Failed {
                message: parsed
                    .error
                    .unwrap_or_else(|| "compositing failed".to_string()),
            },
            "not_found" => JobState::NotFound,
            other => {
                return Err(ProviderError::invalid_output(format!(
                    "render status unknown state: {other}"
                )))
            }
        })
    }
}
