//! Pipeline metrics collection.
//!
//! Counters for retries, polls and stage outcomes, recorded per stage so
//! dashboards can tell a flaky provider from a broken one.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Total provider-call retries by provider.
    pub const RETRIES_TOTAL: &str = "pipeline_retries_total";

    /// Total job-status polls by stage.
    pub const POLLS_TOTAL: &str = "pipeline_polls_total";

    /// Stage completions by stage and outcome.
    pub const STAGES_TOTAL: &str = "pipeline_stages_total";
}

/// Record a retry attempt against a provider.
pub fn record_retry(provider: &str) {
    counter!(
        names::RETRIES_TOTAL,
        "provider" => provider.to_string()
    )
    .increment(1);
}

/// Record a single job-status poll.
pub fn record_poll(stage: &str) {
    counter!(
        names::POLLS_TOTAL,
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record a stage outcome ("completed" or "failed").
pub fn record_stage_outcome(stage: &str, outcome: &'static str) {
    counter!(
        names::STAGES_TOTAL,
        "stage" => stage.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
