//! Bounded polling for long-running provider jobs.
//!
//! Avatar renders and final composites complete minutes after submission.
//! The poller drives an injectable `status_fn` on a schedule until the job
//! reaches a terminal state or the attempt budget runs out. `not_found` is
//! terminal: the external worker may have restarted and lost the job, so
//! more polling cannot help.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use lvid_models::PipelineStage;
use lvid_providers::{JobState, ProviderResult};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics::record_poll;

/// Polling cadence for a long-running job.
#[derive(Debug, Clone)]
pub enum PollSchedule {
    /// Delay grows geometrically every `grow_every` attempts, up to `cap`.
    Geometric {
        initial: Duration,
        factor: f64,
        grow_every: u32,
        cap: Duration,
        max_attempts: u32,
    },
    /// Fixed interval, with a distinct first delay (lets the external
    /// service register the job) and a longer wait after a transient
    /// status-check failure.
    Fixed {
        interval: Duration,
        initial_delay: Duration,
        error_backoff: Duration,
        max_attempts: u32,
    },
}

impl PollSchedule {
    /// Avatar render cadence: ~10 minutes of budget.
    pub fn avatar_default() -> Self {
        Self::Geometric {
            initial: Duration::from_millis(5000),
            factor: 1.2,
            grow_every: 3,
            cap: Duration::from_millis(20_000),
            max_attempts: 40,
        }
    }

    /// Compositing cadence: ~20 minutes of budget.
    pub fn render_default() -> Self {
        Self::Fixed {
            interval: Duration::from_millis(10_000),
            initial_delay: Duration::from_millis(10_000),
            error_backoff: Duration::from_millis(15_000),
            max_attempts: 120,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::Geometric { max_attempts, .. } | Self::Fixed { max_attempts, .. } => {
                *max_attempts
            }
        }
    }

    /// Delay before poll `attempt` (1-based).
    fn delay_before(&self, attempt: u32) -> Duration {
        match self {
            Self::Geometric {
                initial,
                factor,
                grow_every,
                cap,
                ..
            } => {
                let step = (attempt - 1) / (*grow_every).max(1);
                let scaled = initial.as_millis() as f64 * factor.powi(step as i32);
                Duration::from_millis((scaled as u64).min(cap.as_millis() as u64))
            }
            Self::Fixed {
                interval,
                initial_delay,
                ..
            } => {
                if attempt == 1 {
                    *initial_delay
                } else {
                    *interval
                }
            }
        }
    }

    /// Delay before the next poll after a transient status-check failure.
    fn delay_after_error(&self, attempt: u32) -> Duration {
        match self {
            Self::Geometric { .. } => self.delay_before(attempt + 1),
            Self::Fixed { error_backoff, .. } => *error_backoff,
        }
    }
}

/// Poll `status_fn` until the job completes, fails, vanishes, or the
/// attempt budget runs out.
///
/// A retryable error from `status_fn` consumes an attempt and waits the
/// schedule's error backoff; a failed status check is not a failed job. A
/// fatal error is terminal.
pub async fn poll_until_done<T, F, Fut>(
    stage: PipelineStage,
    schedule: &PollSchedule,
    job_id: &str,
    mut status_fn: F,
) -> PipelineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<JobState<T>>>,
{
    let max_attempts = schedule.max_attempts();
    let mut next_delay = schedule.delay_before(1);

    for attempt in 1..=max_attempts {
        tokio::time::sleep(next_delay).await;
        record_poll(stage.as_str());

        match status_fn().await {
            Ok(JobState::Pending { progress_percent }) => {
                debug!(
                    stage = %stage,
                    job_id = %job_id,
                    attempt = attempt,
                    progress = ?progress_percent,
                    "Job still pending"
                );
                next_delay = schedule.delay_before(attempt + 1);
            }
            Ok(JobState::Complete(payload)) => {
                debug!(stage = %stage, job_id = %job_id, attempt = attempt, "Job complete");
                return Ok(payload);
            }
            Ok(JobState::Failed { message }) => {
                return Err(PipelineError::JobFailed { message });
            }
            Ok(JobState::NotFound) => {
                return Err(PipelineError::JobNotFound {
                    job_id: job_id.to_string(),
                });
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    stage = %stage,
                    job_id = %job_id,
                    attempt = attempt,
                    "Status check failed, backing off: {}",
                    e
                );
                next_delay = schedule.delay_after_error(attempt);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(PipelineError::Timeout {
        stage,
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use lvid_providers::ProviderError;
    use tokio::time::Instant;

    fn fast_fixed(max_attempts: u32) -> PollSchedule {
        PollSchedule::Fixed {
            interval: Duration::from_millis(100),
            initial_delay: Duration::from_millis(100),
            error_backoff: Duration::from_millis(300),
            max_attempts,
        }
    }

    #[test]
    fn test_geometric_delays_grow_every_third_attempt() {
        let schedule = PollSchedule::avatar_default();

        assert_eq!(schedule.delay_before(1), Duration::from_millis(5000));
        assert_eq!(schedule.delay_before(3), Duration::from_millis(5000));
        assert_eq!(schedule.delay_before(4), Duration::from_millis(6000));
        assert_eq!(schedule.delay_before(7), Duration::from_millis(7200));
        // Far along, capped
        assert_eq!(schedule.delay_before(40), Duration::from_millis(20_000));
    }

    #[test]
    fn test_fixed_first_delay_differs() {
        let schedule = PollSchedule::render_default();
        assert_eq!(schedule.delay_before(1), Duration::from_millis(10_000));
        assert_eq!(schedule.delay_before(2), Duration::from_millis(10_000));
        assert_eq!(schedule.delay_after_error(5), Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_on_attempt_n() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = poll_until_done(
            PipelineStage::AvatarGeneration,
            &fast_fixed(10),
            "j-1",
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Ok(JobState::Pending {
                            progress_percent: None,
                        })
                    } else {
                        Ok(JobState::Complete("url".to_string()))
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), "url");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_is_timeout() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: PipelineResult<String> = poll_until_done(
            PipelineStage::Rendering,
            &fast_fixed(5),
            "j-2",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    Ok(JobState::Pending {
                        progress_percent: Some(10),
                    })
                }
            },
        )
        .await;

        assert!(matches!(
            result.unwrap_err(),
            PipelineError::Timeout { attempts: 5, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_terminates_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: PipelineResult<String> = poll_until_done(
            PipelineStage::AvatarGeneration,
            &fast_fixed(10),
            "j-3",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(JobState::NotFound) }
            },
        )
        .await;

        assert!(matches!(
            result.unwrap_err(),
            PipelineError::JobNotFound { .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_failure_is_distinct_from_check_failure() {
        let result: PipelineResult<String> = poll_until_done(
            PipelineStage::Rendering,
            &fast_fixed(10),
            "j-4",
            || async {
                Ok(JobState::Failed {
                    message: "encoder crashed".to_string(),
                })
            },
        )
        .await;

        match result.unwrap_err() {
            PipelineError::JobFailed { message } => assert_eq!(message, "encoder crashed"),
            other => panic!("expected JobFailed, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_check_error_waits_error_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let start = Instant::now();

        let result = poll_until_done(
            PipelineStage::Rendering,
            &fast_fixed(10),
            "j-5",
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        Err(ProviderError::retryable("status endpoint 503"))
                    } else {
                        Ok(JobState::Complete(42u32))
                    }
                }
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        // 100ms initial delay + 300ms error backoff
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_check_error_is_terminal() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: PipelineResult<String> = poll_until_done(
            PipelineStage::AvatarGeneration,
            &fast_fixed(10),
            "j-6",
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::fatal("401 unauthorized")) }
            },
        )
        .await;

        assert!(matches!(result.unwrap_err(), PipelineError::Provider(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_avatar_schedule_timing() {
        let times = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let recorder = Arc::clone(&times);
        let start = Instant::now();

        let _: PipelineResult<String> = poll_until_done(
            PipelineStage::AvatarGeneration,
            &PollSchedule::Geometric {
                initial: Duration::from_millis(5000),
                factor: 1.2,
                grow_every: 3,
                cap: Duration::from_millis(20_000),
                max_attempts: 4,
            },
            "j-7",
            move || {
                let recorder = Arc::clone(&recorder);
                async move {
                    recorder.lock().await.push(start.elapsed());
                    Ok(JobState::Pending {
                        progress_percent: None,
                    })
                }
            },
        )
        .await;

        let times = times.lock().await;
        assert_eq!(
            *times,
            vec![
                Duration::from_millis(5000),
                Duration::from_millis(10_000),
                Duration::from_millis(15_000),
                // Fourth poll waits the grown 6000ms interval
                Duration::from_millis(21_000),
            ]
        );
    }
}
