//! Stage orchestration.
//!
//! The orchestrator owns the project state machine and is the single entry
//! point for moving a project forward. A stage runs in three phases:
//! admission (`begin`: validate the transition, take the gate, persist the
//! in-flight status), provider work (`execute`: space, retry, poll), and a
//! guarded persist of the outcome. Both outcome persists carry an
//! expected-status guard so a result arriving after the project was retried
//! into another stage is dropped instead of overwriting newer state.

use std::sync::Arc;

use tracing::{info, warn};

use lvid_models::{
    AvatarOutput, FinalOutput, PipelineStage, ProjectId, VideoProject,
};
use lvid_providers::{
    AvatarRenderer, AvatarRequest, ContentGenerator, ContentRequest, ProviderError,
    RenderRequest, ResearchGatherer, SpeechRequest, SpeechSynthesizer, VideoCompositor,
};
use lvid_store::{ProjectPatch, ProjectStore, StoreError};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::gate::{ConcurrencyGate, StageSlot};
use crate::metrics::record_stage_outcome;
use crate::poller::poll_until_done;
use crate::retry::run_with_retry;
use crate::spacer::RequestSpacer;

/// The provider adapters a pipeline instance drives.
pub struct ProviderSet {
    pub content: Arc<dyn ContentGenerator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub avatar: Arc<dyn AvatarRenderer>,
    pub compositor: Arc<dyn VideoCompositor>,
    /// Optional research enrichment for content generation
    pub research: Option<Arc<ResearchGatherer>>,
}

/// Admitted stage work: the gate slot is held until the ticket is executed
/// or dropped.
pub struct StageTicket {
    project: VideoProject,
    stage: PipelineStage,
    _slot: StageSlot,
}

impl StageTicket {
    pub fn project_id(&self) -> &ProjectId {
        &self.project.id
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }
}

/// Drives projects through the pipeline state machine.
pub struct StageOrchestrator {
    store: Arc<dyn ProjectStore>,
    providers: ProviderSet,
    gate: ConcurrencyGate,
    spacer: RequestSpacer,
    config: PipelineConfig,
}

impl StageOrchestrator {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        providers: ProviderSet,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            providers,
            gate: ConcurrencyGate::new(),
            spacer: RequestSpacer::new(),
            config,
        }
    }

    /// The gate, for callers that want to report availability.
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Validate and admit a stage, persisting the in-flight status.
    ///
    /// Fails without side effects on an illegal transition or a missing
    /// upstream artifact; fails with `Busy` when another stage holds the
    /// gate. On success the project is already in `<stage>_generating`, so
    /// an external observer polling the store always sees in-flight work.
    pub async fn begin(
        &self,
        project_id: &ProjectId,
        stage: PipelineStage,
    ) -> PipelineResult<StageTicket> {
        let project = self.store.get(project_id).await?;

        if project.admissible_stage() != Some(stage) {
            return Err(PipelineError::invalid_transition(project.status, stage));
        }
        if let Some(field) = project.missing_prerequisite(stage) {
            return Err(PipelineError::missing_prerequisite(stage, field));
        }

        let slot = self.gate.try_acquire().ok_or(PipelineError::Busy)?;

        let observed = project.status;
        let updated = self
            .store
            .patch(
                project_id,
                ProjectPatch::new()
                    .expect_status(observed)
                    .with_status(stage.generating_status()),
            )
            .await
            .map_err(|e| {
                // A writer slipped in between the read and the patch
                if e.is_conflict() {
                    PipelineError::Busy
                } else {
                    PipelineError::Store(e)
                }
            })?;

        info!(project_id = %project_id, stage = %stage, "Stage admitted");

        Ok(StageTicket {
            project: updated,
            stage,
            _slot: slot,
        })
    }

    /// Run an admitted stage to completion and persist the outcome.
    pub async fn execute(&self, ticket: StageTicket) -> PipelineResult<VideoProject> {
        let StageTicket {
            project,
            stage,
            _slot,
        } = ticket;
        let project_id = project.id.clone();
        let generating = stage.generating_status();

        let outcome = self.run_stage(&project, stage).await;

        match outcome {
            Ok(patch) => {
                let updated = self
                    .store
                    .patch(
                        &project_id,
                        patch
                            .expect_status(generating)
                            .with_status(stage.ready_status())
                            .clear_error(),
                    )
                    .await
                    .map_err(|e| self.handle_guard_miss(&project_id, stage, e))?;

                record_stage_outcome(stage.as_str(), "completed");
                info!(
                    project_id = %project_id,
                    stage = %stage,
                    status = %updated.status,
                    "Stage completed"
                );
                Ok(updated)
            }
            Err(e) => {
                record_stage_outcome(stage.as_str(), "failed");
                warn!(project_id = %project_id, stage = %stage, "Stage failed: {}", e);

                let fail_patch = ProjectPatch::new()
                    .expect_status(generating)
                    .with_status(lvid_models::ProjectStatus::Failed)
                    .with_error(stage, e.to_string());

                if let Err(store_err) = self.store.patch(&project_id, fail_patch).await {
                    self.handle_guard_miss(&project_id, stage, store_err);
                }

                Err(e)
            }
        }
    }

    /// Move a project into `stage`: validate, admit, run, persist.
    pub async fn advance(
        &self,
        project_id: &ProjectId,
        stage: PipelineStage,
    ) -> PipelineResult<VideoProject> {
        let ticket = self.begin(project_id, stage).await?;
        self.execute(ticket).await
    }

    fn handle_guard_miss(
        &self,
        project_id: &ProjectId,
        stage: PipelineStage,
        e: StoreError,
    ) -> PipelineError {
        if e.is_conflict() {
            // The project moved on while this stage was in flight (e.g. it
            // was failed by the stale detector and retried). Drop the result
            // rather than overwrite newer state.
            warn!(
                project_id = %project_id,
                stage = %stage,
                "Discarding late stage result: {}",
                e
            );
        }
        PipelineError::Store(e)
    }

    async fn run_stage(
        &self,
        project: &VideoProject,
        stage: PipelineStage,
    ) -> PipelineResult<ProjectPatch> {
        match stage {
            PipelineStage::ContentGeneration => self.run_content(project).await,
            PipelineStage::AudioGeneration => self.run_audio(project).await,
            PipelineStage::AvatarGeneration => self.run_avatar(project).await,
            PipelineStage::Rendering => self.run_render(project).await,
        }
    }

    async fn run_content(&self, project: &VideoProject) -> PipelineResult<ProjectPatch> {
        let source = &project.source_config;

        // Best-effort enrichment; a failed gather never fails the stage.
        let research_context = match &self.providers.research {
            Some(gatherer) => gatherer.gather(&source.topic, &source.urls).await,
            None => None,
        };

        let request = ContentRequest {
            template_type: project.template_type,
            topic: source.topic.clone(),
            level: source.level,
            target_duration_seconds: source.target_duration_seconds,
            native_language: source.native_language.clone(),
            research_context,
        };

        self.spacer
            .space(self.providers.content.name(), self.config.content_spacing)
            .await;

        let content = run_with_retry(
            &self.config.content_retry,
            || self.providers.content.generate(&request),
            |_, _, _| {},
        )
        .await?;

        // Adapters validate too, but no artifact reaches the store without
        // passing this check.
        if let Some(field) = content.missing_required_field() {
            return Err(ProviderError::invalid_output(format!(
                "lesson content missing required field: {field}"
            ))
            .into());
        }

        Ok(ProjectPatch::new().with_lesson_content(content))
    }

    async fn run_audio(&self, project: &VideoProject) -> PipelineResult<ProjectPatch> {
        let script = project
            .lesson_content
            .as_ref()
            .map(|c| c.full_script.clone())
            .ok_or(PipelineError::missing_prerequisite(
                PipelineStage::AudioGeneration,
                "lesson_content.full_script",
            ))?;

        let request = SpeechRequest {
            script,
            voice_id: project.voice_config.voice_id.clone(),
        };

        self.spacer
            .space(self.providers.speech.name(), self.config.speech_spacing)
            .await;

        let audio = run_with_retry(
            &self.config.speech_retry,
            || self.providers.speech.synthesize(&request),
            |_, _, _| {},
        )
        .await?;

        Ok(ProjectPatch::new().with_audio_output(audio))
    }

    async fn run_avatar(&self, project: &VideoProject) -> PipelineResult<ProjectPatch> {
        let audio_url = project
            .audio_output
            .as_ref()
            .map(|a| a.url.clone())
            .ok_or(PipelineError::missing_prerequisite(
                PipelineStage::AvatarGeneration,
                "audio_output.url",
            ))?;

        let request = AvatarRequest {
            audio_url,
            character_id: project.avatar_config.character_id.clone(),
            aspect_ratio: project.video_settings.aspect_ratio,
        };

        self.spacer
            .space(self.providers.avatar.name(), self.config.avatar_spacing)
            .await;

        let handle = run_with_retry(
            &self.config.avatar_submit_retry,
            || self.providers.avatar.submit(&request),
            |_, _, _| {},
        )
        .await?;

        info!(
            project_id = %project.id,
            job_id = %handle.job_id,
            "Avatar render submitted"
        );

        let payload = poll_until_done(
            PipelineStage::AvatarGeneration,
            &self.config.avatar_poll,
            &handle.job_id,
            || self.providers.avatar.status(&handle),
        )
        .await?;

        Ok(ProjectPatch::new().with_avatar_output(AvatarOutput {
            url: payload.result_url,
            provider_job_id: handle.job_id,
        }))
    }

    async fn run_render(&self, project: &VideoProject) -> PipelineResult<ProjectPatch> {
        let request = RenderRequest {
            project_id: project.id.clone(),
            settings: project.video_settings.clone(),
        };

        self.spacer
            .space(
                self.providers.compositor.name(),
                self.config.render_spacing,
            )
            .await;

        let handle = run_with_retry(
            &self.config.render_submit_retry,
            || self.providers.compositor.submit(&request),
            |_, _, _| {},
        )
        .await?;

        info!(
            project_id = %project.id,
            job_id = %handle.job_id,
            "Compositing job submitted"
        );

        let payload = poll_until_done(
            PipelineStage::Rendering,
            &self.config.render_poll,
            &handle.job_id,
            || self.providers.compositor.status(&handle),
        )
        .await?;

        Ok(ProjectPatch::new().with_final_output(FinalOutput {
            url: payload.result_url,
        }))
    }
}
