//! In-memory project store.
//!
//! Backs the dev server and every test. A single `RwLock` over the map makes
//! each patch atomic with respect to concurrent readers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use lvid_models::{ProjectId, VideoProject};

use crate::error::{StoreError, StoreResult};
use crate::patch::ProjectPatch;
use crate::ProjectStore;

/// In-memory [`ProjectStore`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    projects: Arc<RwLock<HashMap<ProjectId, VideoProject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn get(&self, id: &ProjectId) -> StoreResult<VideoProject> {
        let projects = self.projects.read().await;
        projects
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn insert(&self, project: VideoProject) -> StoreResult<()> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(StoreError::AlreadyExists(project.id));
        }
        debug!(project_id = %project.id, "Inserted project");
        projects.insert(project.id.clone(), project);
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<VideoProject>> {
        let projects = self.projects.read().await;
        let mut all: Vec<VideoProject> = projects.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn patch(&self, id: &ProjectId, patch: ProjectPatch) -> StoreResult<VideoProject> {
        let mut projects = self.projects.write().await;
        let project = projects
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if let Some(expected) = patch.expected_status {
            if project.status != expected {
                return Err(StoreError::Conflict {
                    id: id.clone(),
                    expected: expected.to_string(),
                    actual: project.status.to_string(),
                });
            }
        }

        patch.apply(project);
        Ok(project.clone())
    }
}
