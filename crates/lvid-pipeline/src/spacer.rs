//! Per-provider request spacing.
//!
//! Upstream providers enforce burst-rate limits that are stricter than (and
//! independent of) the retry policy. The spacer guarantees a minimum
//! wall-clock interval between consecutive outbound calls to the same named
//! provider, across all projects, by reserving the caller's slot under a
//! lock and sleeping outside it.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Minimum-interval gate keyed by provider name.
#[derive(Default)]
pub struct RequestSpacer {
    reserved: Mutex<HashMap<String, Instant>>,
}

impl RequestSpacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until at least `min_interval` has elapsed since the previous
    /// call tagged with `provider`, then record this call.
    ///
    /// The slot is reserved while the lock is held, so concurrent callers
    /// serialize: each waits for the slot before it. The wait itself is a
    /// cooperative sleep.
    pub async fn space(&self, provider: &str, min_interval: Duration) {
        let wake_at = {
            let mut reserved = self.reserved.lock().await;
            let now = Instant::now();
            let wake_at = match reserved.get(provider) {
                Some(prev) => (*prev + min_interval).max(now),
                None => now,
            };
            reserved.insert(provider.to_string(), wake_at);
            wake_at
        };

        let wait = wake_at.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!(
                provider = %provider,
                wait_ms = wait.as_millis() as u64,
                "Spacing provider call"
            );
        }
        tokio::time::sleep_until(wake_at).await;
    }
}
