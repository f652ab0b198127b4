//! Background detection of stuck projects.
//!
//! A process restart can orphan a project in a `*_generating` status with no
//! stage actually running. This service scans the store periodically and
//! fails any project that has been in flight past a threshold, so the UI
//! offers a retry instead of showing a spinner forever.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{error, info, warn};

use lvid_models::ProjectStatus;
use lvid_store::{ProjectPatch, ProjectStore};

/// Stale project detector service.
pub struct StaleProjectDetector {
    store: Arc<dyn ProjectStore>,
    /// How long a project may sit in a `*_generating` status
    threshold: Duration,
    /// Scan interval
    scan_interval: Duration,
    enabled: bool,
}

impl StaleProjectDetector {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        let enabled = std::env::var("ENABLE_STALE_DETECTION")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        let threshold = Duration::from_secs(
            std::env::var("STALE_THRESHOLD_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1800),
        );

        Self {
            store,
            threshold,
            scan_interval: Duration::from_secs(60),
            enabled,
        }
    }

    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Start the background detection loop.
    ///
    /// Runs indefinitely; spawn it as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Stale project detection is disabled");
            return;
        }

        info!(
            "Starting stale project detector (interval: {:?}, threshold: {:?})",
            self.scan_interval, self.threshold
        );

        let mut ticker = interval(self.scan_interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.check_once().await {
                error!("Stale project detection error: {}", e);
            }
        }
    }

    /// Run a single detection cycle. Returns (stale, recovered) counts.
    pub async fn check_once(&self) -> anyhow::Result<(u32, u32)> {
        let projects = self.store.list().await?;

        let mut stale_count = 0u32;
        let mut recovered_count = 0u32;
        let now = Utc::now();

        for project in projects {
            let Some(stage) = project.status.in_flight_stage() else {
                continue;
            };

            let age = (now - project.updated_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            if age < self.threshold {
                continue;
            }

            stale_count += 1;
            warn!(
                project_id = %project.id,
                stage = %stage,
                updated_at = %project.updated_at,
                "Detected stale project"
            );

            let patch = ProjectPatch::new()
                .expect_status(project.status)
                .with_status(ProjectStatus::Failed)
                .with_error(
                    stage,
                    "Processing timed out. The pipeline may have restarted. Retry the step.",
                );

            match self.store.patch(&project.id, patch).await {
                Ok(_) => {
                    recovered_count += 1;
                    info!(project_id = %project.id, "Recovered stale project");
                }
                Err(e) if e.is_conflict() => {
                    // The stage finished (or was retried) between the scan
                    // and the patch; nothing to recover.
                }
                Err(e) => {
                    error!(project_id = %project.id, "Failed to recover stale project: {}", e);
                }
            }
        }

        if stale_count > 0 {
            info!(
                "Stale project detection complete: {} stale, {} recovered",
                stale_count, recovered_count
            );
        }

        Ok((stale_count, recovered_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lvid_models::{
        AvatarConfig, CefrLevel, PipelineStage, SourceConfig, SourceMode, TemplateType,
        VideoProject, VideoSettings, VoiceConfig,
    };
    use lvid_store::MemoryStore;

    fn project_in(status: ProjectStatus, age: chrono::Duration) -> VideoProject {
        let mut project = VideoProject::new(
            "Stale test",
            TemplateType::GrammarLesson,
            SourceConfig {
                topic: "idioms".to_string(),
                level: CefrLevel::B2,
                target_duration_seconds: 240,
                native_language: "French".to_string(),
                urls: vec![],
                mode: SourceMode::Topic,
            },
            VoiceConfig {
                provider: "speech".to_string(),
                voice_id: "v".to_string(),
                voice_name: "V".to_string(),
            },
            AvatarConfig {
                provider: "avatar".to_string(),
                character_id: "c".to_string(),
                character_name: "C".to_string(),
            },
            VideoSettings::default(),
        );
        project.status = status;
        project.updated_at = Utc::now() - age;
        project
    }

    #[tokio::test]
    async fn test_old_in_flight_project_is_failed() {
        let store = Arc::new(MemoryStore::new());
        let project = project_in(ProjectStatus::ContentGenerating, chrono::Duration::hours(2));
        let id = project.id.clone();
        store.insert(project).await.unwrap();

        let detector = StaleProjectDetector::new(store.clone())
            .with_threshold(Duration::from_secs(1800));
        let (stale, recovered) = detector.check_once().await.unwrap();

        assert_eq!((stale, recovered), (1, 1));

        let failed = store.get(&id).await.unwrap();
        assert_eq!(failed.status, ProjectStatus::Failed);
        assert_eq!(failed.error_step, Some(PipelineStage::ContentGeneration));
    }

    #[tokio::test]
    async fn test_recent_and_settled_projects_untouched() {
        let store = Arc::new(MemoryStore::new());
        let recent = project_in(ProjectStatus::AudioGenerating, chrono::Duration::seconds(10));
        let ready = project_in(ProjectStatus::ContentReady, chrono::Duration::hours(5));
        let recent_id = recent.id.clone();
        let ready_id = ready.id.clone();
        store.insert(recent).await.unwrap();
        store.insert(ready).await.unwrap();

        let detector = StaleProjectDetector::new(store.clone())
            .with_threshold(Duration::from_secs(1800));
        let (stale, _) = detector.check_once().await.unwrap();

        assert_eq!(stale, 0);
        assert_eq!(
            store.get(&recent_id).await.unwrap().status,
            ProjectStatus::AudioGenerating
        );
        assert_eq!(
            store.get(&ready_id).await.unwrap().status,
            ProjectStatus::ContentReady
        );
    }
}
