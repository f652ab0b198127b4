//! Stage trigger handlers.
//!
//! One endpoint per pipeline stage. Each validates and admits the stage
//! synchronously (so the caller gets busy/conflict/missing-prerequisite
//! answers immediately), then runs the provider work in a background task.
//! Completion is observed by re-reading the project.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use lvid_models::{PipelineStage, ProjectId};

use crate::error::ApiResult;
use crate::state::AppState;

/// Response for an accepted stage trigger.
#[derive(Debug, Serialize)]
pub struct StageAccepted {
    pub status: &'static str,
    pub project_id: String,
    pub stage: PipelineStage,
}

/// POST /api/projects/:project_id/generate-content
pub async fn generate_content(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<(StatusCode, Json<StageAccepted>)> {
    trigger_stage(state, project_id, PipelineStage::ContentGeneration).await
}

/// POST /api/projects/:project_id/generate-audio
pub async fn generate_audio(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<(StatusCode, Json<StageAccepted>)> {
    trigger_stage(state, project_id, PipelineStage::AudioGeneration).await
}

/// POST /api/projects/:project_id/generate-avatar
pub async fn generate_avatar(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<(StatusCode, Json<StageAccepted>)> {
    trigger_stage(state, project_id, PipelineStage::AvatarGeneration).await
}

/// POST /api/projects/:project_id/render
pub async fn render(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<(StatusCode, Json<StageAccepted>)> {
    trigger_stage(state, project_id, PipelineStage::Rendering).await
}

async fn trigger_stage(
    state: AppState,
    project_id: String,
    stage: PipelineStage,
) -> ApiResult<(StatusCode, Json<StageAccepted>)> {
    let id = ProjectId::from(project_id);

    // Admission is synchronous: invalid transitions, missing artifacts and
    // the busy gate all surface here, before the caller gets a 202.
    let ticket = state.orchestrator.begin(&id, stage).await?;

    info!(project_id = %id, stage = %stage, "Stage trigger accepted");

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        // The outcome (ready or failed) is persisted by the orchestrator;
        // nothing to do here but log.
        if let Err(e) = orchestrator.execute(ticket).await {
            warn!(stage = %stage, "Stage ended in failure: {}", e);
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(StageAccepted {
            status: "accepted",
            project_id: id.to_string(),
            stage,
        }),
    ))
}
