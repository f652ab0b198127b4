//! Store error types.

use thiserror::Error;

use lvid_models::ProjectId;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(ProjectId),

    #[error("Project already exists: {0}")]
    AlreadyExists(ProjectId),

    #[error("Conflict on {id}: expected status {expected}, found {actual}")]
    Conflict {
        id: ProjectId,
        expected: String,
        actual: String,
    },

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Check if this is the optimistic-guard conflict case.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
