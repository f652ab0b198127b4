//! Provider adapters for the LessonVid pipeline.
//!
//! Each external service (content generation, speech synthesis, avatar
//! rendering, compositing, web search) is wrapped behind a narrow trait.
//! Adapters classify failures as retryable or fatal but never retry
//! themselves; the pipeline's retry policy owns that decision.

pub mod avatar;
pub mod compositor;
pub mod content;
pub mod error;
pub mod research;
pub mod speech;
pub mod types;

// Re-export common types
pub use avatar::{AvatarProviderConfig, AvatarRenderer, HttpAvatarRenderer, AVATAR_PROVIDER};
pub use compositor::{CompositorConfig, HttpVideoCompositor, VideoCompositor, RENDER_PROVIDER};
pub use content::{
    ContentConfig, ContentGenerator, HttpContentGenerator, CONTENT_PROVIDER,
};
pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use research::{
    HttpWebSearch, ResearchGatherer, SearchConfig, SearchResult, WebSearch, SEARCH_PROVIDER,
};
pub use speech::{HttpSpeechSynthesizer, SpeechConfig, SpeechSynthesizer, SPEECH_PROVIDER};
pub use types::{
    AvatarJobPayload, AvatarRequest, ContentRequest, JobHandle, JobState, RenderJobPayload,
    RenderRequest, SpeechRequest,
};
