//! Project persistence boundary.
//!
//! The pipeline only ever talks to [`ProjectStore`]; swapping the backing
//! store does not touch orchestration code. Patches are atomic per call and
//! carry an optional expected-status guard so a stale writer (a provider
//! result arriving after the project was retried into another stage) cannot
//! overwrite newer state.

mod error;
mod memory;
mod patch;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use patch::{ErrorPatch, ProjectPatch};

use async_trait::async_trait;

use lvid_models::{ProjectId, VideoProject};

/// Persistence contract for video projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Fetch a project by ID.
    async fn get(&self, id: &ProjectId) -> StoreResult<VideoProject>;

    /// Insert a new project. Fails if the ID already exists.
    async fn insert(&self, project: VideoProject) -> StoreResult<()>;

    /// List all projects, most recently created first.
    async fn list(&self) -> StoreResult<Vec<VideoProject>>;

    /// Apply a patch atomically and return the updated project.
    ///
    /// When the patch carries `expected_status` and the stored status
    /// differs, nothing is written and `StoreError::Conflict` is returned.
    async fn patch(&self, id: &ProjectId, patch: ProjectPatch) -> StoreResult<VideoProject>;
}
