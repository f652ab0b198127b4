//! Project CRUD handlers (the pipeline-facing subset).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use lvid_models::{
    AvatarConfig, ProjectId, SourceConfig, TemplateType, VideoProject, VideoSettings, VoiceConfig,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Request body for creating a project.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub template_type: TemplateType,
    pub source_config: SourceConfig,
    pub voice_config: VoiceConfig,
    pub avatar_config: AvatarConfig,
    #[serde(default)]
    pub video_settings: VideoSettings,
}

/// POST /api/projects
///
/// Create a draft project. The pipeline is driven separately through the
/// per-stage trigger endpoints.
pub async fn create_project(
    State(state): State<AppState>,
    Json(body): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<VideoProject>)> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    if body.source_config.topic.trim().is_empty() {
        return Err(ApiError::bad_request("source_config.topic must not be empty"));
    }

    let project = VideoProject::new(
        body.title,
        body.template_type,
        body.source_config,
        body.voice_config,
        body.avatar_config,
        body.video_settings,
    );

    info!(project_id = %project.id, title = %project.title, "Creating project");

    state.store.insert(project.clone()).await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<VideoProject>>> {
    let projects = state.store.list().await?;
    Ok(Json(projects))
}

/// GET /api/projects/:project_id
///
/// Callers poll this to observe stage completion; the status field moves
/// through the pipeline state machine as stages run.
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<VideoProject>> {
    let id = ProjectId::from(project_id);
    let project = state.store.get(&id).await?;
    Ok(Json(project))
}
