//! Per-attempt timeout enforcement and inter-attempt backoff for the router
//! (spec.md §4.6, §5).
//!
//! The router itself owns the attempt loop and chain-walking logic
//! (`denis-routing`); this crate supplies the two mechanical pieces that
//! loop needs: a jittered backoff delay between attempts, and a
//! classifier that maps a failed [`ProviderCallResult`] onto the
//! `retry_on` vocabulary named in an [`AttemptPolicy`].

use denis_core::plan::RetryOn;
use denis_core::ProviderCallResult;
use rand::Rng;
use std::time::Duration;

/// Backoff configuration for the short jittered pause between attempts.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per subsequent attempt.
    pub multiplier: f64,
    /// Jitter fraction applied symmetrically around the computed delay (0.0–1.0).
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

/// Computes the jittered delay to wait between attempts `attempt` and
/// `attempt + 1` (0-indexed: the pause before the *second* attempt uses
/// `attempt = 0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BackoffPolicy {
    config: BackoffConfig,
}

impl BackoffPolicy {
    /// Build a policy from an explicit configuration.
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Build a policy with the default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BackoffConfig::default())
    }

    /// Delay before the attempt following `attempt` (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay.as_millis() as f64;
        let delay = (base * self.config.multiplier.powi(attempt as i32))
            .min(self.config.max_delay.as_millis() as f64);

        let jitter_range = delay * self.config.jitter;
        let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
        Duration::from_millis((delay + jitter).max(0.0) as u64)
    }
}

/// Classify a failed [`ProviderCallResult`] onto the `retry_on` vocabulary
/// (spec.md §3.4). Returns `None` when the failure doesn't match either
/// recognized condition (e.g. `*_empty_response`, `exception:*`) — those
/// still count as a failed attempt, they simply aren't gated by
/// `retry_on` the way timeout/5xx are (spec.md §4.6: "transient backend
/// failure ... counted as a failed attempt; router advances per
/// `retry_on`" applies uniformly, this classifier exists to support
/// policies that distinguish the two).
#[must_use]
pub fn classify_failure(result: &ProviderCallResult) -> Option<RetryOn> {
    let error = result.error.as_deref()?;
    if error.ends_with("_timeout") {
        return Some(RetryOn::Timeout);
    }
    if let Some(status) = error.rsplit("_http_").next() {
        if status != error {
            if let Ok(code) = status.parse::<u16>() {
                if (500..600).contains(&code) {
                    return Some(RetryOn::ServerError5xx);
                }
            }
        }
    }
    None
}

/// Whether `policy` permits advancing to the next engine after this
/// failure. A classifier miss (e.g. empty response, transport exception)
/// is still treated as advancing — only an *unset* `retry_on` that would
/// have matched blocks the chain (spec.md §7: `retry_on = {}` makes the
/// first failure terminal).
#[must_use]
pub fn should_advance(retry_on: &std::collections::HashSet<RetryOn>, result: &ProviderCallResult) -> bool {
    match classify_failure(result) {
        Some(kind) => retry_on.contains(&kind),
        None => !retry_on.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denis_core::{EngineId, ProviderFamily};

    fn failure(error: &str) -> ProviderCallResult {
        ProviderCallResult::failure(ProviderFamily::Groq, EngineId::new("b1"), "m", error, 10)
    }

    #[test]
    fn classifies_timeout_and_5xx() {
        assert_eq!(classify_failure(&failure("groq_timeout")), Some(RetryOn::Timeout));
        assert_eq!(
            classify_failure(&failure("groq_http_503")),
            Some(RetryOn::ServerError5xx)
        );
        assert_eq!(classify_failure(&failure("groq_http_400")), None);
        assert_eq!(classify_failure(&failure("groq_empty_response")), None);
    }

    #[test]
    fn empty_retry_on_blocks_even_unclassified_failures() {
        let retry_on = std::collections::HashSet::new();
        assert!(!should_advance(&retry_on, &failure("groq_empty_response")));
        assert!(!should_advance(&retry_on, &failure("groq_timeout")));
    }

    #[test]
    fn retry_on_gates_by_classification() {
        let retry_on = std::collections::HashSet::from([RetryOn::Timeout]);
        assert!(should_advance(&retry_on, &failure("groq_timeout")));
        assert!(!should_advance(&retry_on, &failure("groq_http_503")));
        assert!(should_advance(&retry_on, &failure("groq_empty_response")));
    }

    #[test]
    fn delay_grows_and_caps() {
        let policy = BackoffPolicy::new(BackoffConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            multiplier: 2.0,
            jitter: 0.0,
        });
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(300));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(300));
    }
}
