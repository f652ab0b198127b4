//! Pipeline configuration.

use std::time::Duration;

use lvid_providers::{AVATAR_PROVIDER, CONTENT_PROVIDER, RENDER_PROVIDER, SPEECH_PROVIDER};

use crate::poller::PollSchedule;
use crate::retry::RetryConfig;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Retry policy for content generation (matches provider-side throttling)
    pub content_retry: RetryConfig,
    /// Retry policy for speech synthesis
    pub speech_retry: RetryConfig,
    /// Retry policy for avatar-render submission
    pub avatar_submit_retry: RetryConfig,
    /// Retry policy for compositing submission
    pub render_submit_retry: RetryConfig,

    /// Poll cadence for avatar renders
    pub avatar_poll: PollSchedule,
    /// Poll cadence for compositing jobs
    pub render_poll: PollSchedule,

    /// Minimum interval between calls to the content provider
    pub content_spacing: Duration,
    /// Minimum interval between calls to the speech provider
    pub speech_spacing: Duration,
    /// Minimum interval between calls to the avatar provider
    pub avatar_spacing: Duration,
    /// Minimum interval between calls to the render service
    pub render_spacing: Duration,

    /// Character budget per research source
    pub research_chars_per_source: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            content_retry: RetryConfig::new(CONTENT_PROVIDER)
                .with_max_retries(4)
                .with_base_delay(Duration::from_millis(3000))
                .with_max_delay(Duration::from_secs(60))
                .with_growth_factor(2.0),
            speech_retry: RetryConfig::new(SPEECH_PROVIDER)
                .with_max_retries(3)
                .with_base_delay(Duration::from_millis(1000))
                .with_max_delay(Duration::from_secs(30)),
            avatar_submit_retry: RetryConfig::new(AVATAR_PROVIDER)
                .with_max_retries(3)
                .with_base_delay(Duration::from_millis(1000))
                .with_max_delay(Duration::from_secs(30)),
            render_submit_retry: RetryConfig::new(RENDER_PROVIDER)
                .with_max_retries(3)
                .with_base_delay(Duration::from_millis(1000))
                .with_max_delay(Duration::from_secs(30)),
            avatar_poll: PollSchedule::avatar_default(),
            render_poll: PollSchedule::render_default(),
            content_spacing: Duration::from_millis(3000),
            speech_spacing: Duration::from_millis(2000),
            avatar_spacing: Duration::from_millis(2000),
            render_spacing: Duration::from_millis(2000),
            research_chars_per_source: 2000,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(n) = env_u32("PIPELINE_CONTENT_MAX_RETRIES") {
            config.content_retry.max_retries = n;
        }
        if let Some(ms) = env_u64("PIPELINE_CONTENT_BASE_DELAY_MS") {
            config.content_retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("PIPELINE_CONTENT_SPACING_MS") {
            config.content_spacing = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("PIPELINE_SPEECH_SPACING_MS") {
            config.speech_spacing = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("PIPELINE_AVATAR_SPACING_MS") {
            config.avatar_spacing = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("PIPELINE_RENDER_SPACING_MS") {
            config.render_spacing = Duration::from_millis(ms);
        }
        if let Some(n) = env_u64("PIPELINE_RESEARCH_CHARS") {
            config.research_chars_per_source = n as usize;
        }

        config
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}
