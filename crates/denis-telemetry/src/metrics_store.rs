//! Rolling Metrics Store (spec.md §3.7, §5; SPEC_FULL.md §3.8).
//!
//! Per-engine bounded window of `{ts, latency_ms, success}` observations.
//! Backed by an in-process `parking_lot::Mutex<HashMap<..>>` — no Redis
//! dependency, matching the original's `RedisMetricsStore` fallback
//! behavior of degrading to static per-family defaults whenever no
//! observations have been recorded yet.

use denis_core::{EngineId, ProviderFamily};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Maximum observations retained per engine before the oldest is evicted.
const WINDOW_CAPACITY: usize = 200;

/// Observations older than this are excluded from `error_rate_1h`.
const ERROR_RATE_WINDOW: Duration = Duration::from_secs(3600);

/// A single recorded call outcome.
#[derive(Debug, Clone, Copy)]
struct Observation {
    at: Instant,
    latency_ms: u64,
    success: bool,
}

/// Default latency assumed for a family with no observations yet, in
/// milliseconds (spec.md §3.8, ported from the original's hardcoded
/// `RedisMetricsStore` fallback table).
#[must_use]
pub fn default_latency_ms(family: ProviderFamily) -> u64 {
    match family {
        ProviderFamily::LlamaCpp => 180,
        ProviderFamily::Groq => 250,
        ProviderFamily::OpenRouter => 450,
        ProviderFamily::Vllm => 150,
        ProviderFamily::Anthropic => 500,
        ProviderFamily::Perplexity => 500,
    }
}

/// Derived statistics for one engine, computed at read time (spec.md §3.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStats {
    /// 95th percentile latency over the retained window, in milliseconds.
    pub latency_p95_ms: u64,
    /// Fraction of calls in the last hour that failed.
    pub error_rate_1h: f64,
    /// Fraction of recorded calls, ever, that succeeded.
    pub availability: f64,
}

struct EngineWindow {
    observations: Vec<Observation>,
}

impl EngineWindow {
    fn new() -> Self {
        Self {
            observations: Vec::new(),
        }
    }

    fn record(&mut self, latency_ms: u64, success: bool) {
        if self.observations.len() >= WINDOW_CAPACITY {
            self.observations.remove(0);
        }
        self.observations.push(Observation {
            at: Instant::now(),
            latency_ms,
            success,
        });
    }

    fn stats(&self, default_latency_ms: u64) -> EngineStats {
        if self.observations.is_empty() {
            return EngineStats {
                latency_p95_ms: default_latency_ms,
                error_rate_1h: 0.0,
                availability: 1.0,
            };
        }

        let mut latencies: Vec<u64> = self.observations.iter().map(|o| o.latency_ms).collect();
        latencies.sort_unstable();
        #[allow(clippy::cast_precision_loss, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let idx = (((latencies.len() - 1) as f64) * 0.95).round() as usize;
        let latency_p95_ms = latencies[idx.min(latencies.len() - 1)];

        let now = Instant::now();
        let recent: Vec<&Observation> = self
            .observations
            .iter()
            .filter(|o| now.duration_since(o.at) <= ERROR_RATE_WINDOW)
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let error_rate_1h = if recent.is_empty() {
            0.0
        } else {
            let failures = recent.iter().filter(|o| !o.success).count();
            failures as f64 / recent.len() as f64
        };

        #[allow(clippy::cast_precision_loss)]
        let availability = {
            let successes = self.observations.iter().filter(|o| o.success).count();
            successes as f64 / self.observations.len() as f64
        };

        EngineStats {
            latency_p95_ms,
            error_rate_1h,
            availability,
        }
    }
}

/// In-process rolling metrics store, shared read/write across the router
/// and the legacy heuristic scorer.
pub struct MetricsStore {
    windows: Mutex<HashMap<EngineId, EngineWindow>>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a call outcome for `engine_id`.
    pub fn record(&self, engine_id: &EngineId, latency_ms: u64, success: bool) {
        let mut windows = self.windows.lock();
        windows
            .entry(engine_id.clone())
            .or_insert_with(EngineWindow::new)
            .record(latency_ms, success);
    }

    /// Derived stats for `engine_id`, falling back to `family`'s static
    /// default latency when there are no observations yet.
    #[must_use]
    pub fn stats(&self, engine_id: &EngineId, family: ProviderFamily) -> EngineStats {
        let windows = self.windows.lock();
        windows.get(engine_id).map_or_else(
            || EngineStats {
                latency_p95_ms: default_latency_ms(family),
                error_rate_1h: 0.0,
                availability: 1.0,
            },
            |window| window.stats(default_latency_ms(family)),
        )
    }

    /// Drop all recorded observations. Test/ops utility.
    pub fn clear(&self) {
        self.windows.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_engine_uses_family_default() {
        let store = MetricsStore::new();
        let stats = store.stats(&EngineId::new("L1"), ProviderFamily::LlamaCpp);
        assert_eq!(stats.latency_p95_ms, 180);
        assert_eq!(stats.availability, 1.0);
        assert_eq!(stats.error_rate_1h, 0.0);
    }

    #[test]
    fn records_affect_availability() {
        let store = MetricsStore::new();
        let id = EngineId::new("G1");
        store.record(&id, 100, true);
        store.record(&id, 100, true);
        store.record(&id, 100, false);

        let stats = store.stats(&id, ProviderFamily::Groq);
        assert!((stats.availability - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn window_evicts_oldest_beyond_capacity() {
        let store = MetricsStore::new();
        let id = EngineId::new("V1");
        for i in 0..(WINDOW_CAPACITY + 10) {
            store.record(&id, u64::try_from(i).unwrap(), true);
        }
        let windows = store.windows.lock();
        assert_eq!(windows.get(&id).unwrap().observations.len(), WINDOW_CAPACITY);
    }

    #[test]
    fn latency_p95_is_high_percentile_of_window() {
        let store = MetricsStore::new();
        let id = EngineId::new("O1");
        for latency in 1..=100u64 {
            store.record(&id, latency, true);
        }
        let stats = store.stats(&id, ProviderFamily::OpenRouter);
        assert_eq!(stats.latency_p95_ms, 95);
    }
}
