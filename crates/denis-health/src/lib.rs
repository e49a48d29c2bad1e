//! # Denis Health
//!
//! Internet reachability probe and cache (spec.md §4.2).
//!
//! Fails open: a probe error yields `DOWN`, never a panic or propagated
//! error. Probes are serialized by a single lock; readers observe the
//! cached value without blocking, matching the narrow-lock resource model of
//! spec.md §5 and the atomic-state idiom of `gateway-resilience`'s circuit
//! breaker.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use denis_core::InternetStatus;
use parking_lot::Mutex;
use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Name of the override env var (spec.md §6.5).
pub const ENV_INTERNET_STATUS: &str = "DENIS_INTERNET_STATUS";

/// Default cache TTL (spec.md §4.2).
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

fn status_to_code(status: InternetStatus) -> u8 {
    match status {
        InternetStatus::Unknown => 0,
        InternetStatus::Ok => 1,
        InternetStatus::Down => 2,
    }
}

fn code_to_status(code: u8) -> InternetStatus {
    match code {
        1 => InternetStatus::Ok,
        2 => InternetStatus::Down,
        _ => InternetStatus::Unknown,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A reachability probe: returns `true` when the network is up. Defaults to
/// a short-timeout TCP connect to a well-known address; injectable for
/// tests.
pub type ProbeFn = Box<dyn Fn() -> bool + Send + Sync>;

/// Default probe: attempt a bounded TCP connect to `8.8.8.8:53`.
fn default_probe() -> bool {
    TcpStream::connect_timeout(
        &"8.8.8.8:53".parse().expect("valid socket addr"),
        Duration::from_millis(500),
    )
    .is_ok()
}

/// Cached, override-aware Internet Health probe (spec.md §3.2, §4.2).
pub struct InternetHealth {
    ttl: Duration,
    status: AtomicU8,
    last_check_ms: AtomicU64,
    probe_lock: Mutex<()>,
    probe: ProbeFn,
}

impl InternetHealth {
    /// Build a health probe with the default TTL and reachability probe.
    #[must_use]
    pub fn new() -> Self {
        Self::with_probe(DEFAULT_TTL, Box::new(default_probe))
    }

    /// Build a health probe with an explicit TTL and probe function —
    /// production code uses the default; tests inject a deterministic one.
    #[must_use]
    pub fn with_probe(ttl: Duration, probe: ProbeFn) -> Self {
        Self {
            ttl,
            status: AtomicU8::new(status_to_code(InternetStatus::Unknown)),
            last_check_ms: AtomicU64::new(0),
            probe_lock: Mutex::new(()),
            probe,
        }
    }

    /// Check current status (spec.md §4.2 contract):
    ///   1. `DENIS_INTERNET_STATUS`, if set to a legal value, wins verbatim —
    ///      no probe, not even a cache read.
    ///   2. Otherwise the cached value, if younger than `ttl`.
    ///   3. Otherwise a fresh probe, serialized by `probe_lock`.
    #[must_use]
    pub fn check(&self) -> InternetStatus {
        if let Ok(raw) = std::env::var(ENV_INTERNET_STATUS) {
            if let Some(status) = InternetStatus::parse(&raw) {
                return status;
            }
            tracing::warn!(value = %raw, "ignoring unrecognized {ENV_INTERNET_STATUS} override");
        }

        let now = now_ms();
        if self.is_fresh(now) {
            return code_to_status(self.status.load(Ordering::Acquire));
        }

        let _guard = self.probe_lock.lock();
        // Another thread may have refreshed the cache while we waited.
        let now = now_ms();
        if self.is_fresh(now) {
            return code_to_status(self.status.load(Ordering::Acquire));
        }

        let reachable = (self.probe)();
        let status = if reachable {
            InternetStatus::Ok
        } else {
            InternetStatus::Down
        };
        self.status.store(status_to_code(status), Ordering::Release);
        self.last_check_ms.store(now, Ordering::Release);
        status
    }

    fn is_fresh(&self, now: u64) -> bool {
        let last = self.last_check_ms.load(Ordering::Acquire);
        last != 0 && now.saturating_sub(last) < self.ttl.as_millis() as u64
    }
}

impl Default for InternetHealth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting_probe(result: bool) -> (ProbeFn, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let probe: ProbeFn = Box::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            result
        });
        (probe, calls)
    }

    #[test]
    fn override_wins_verbatim_without_probing() {
        std::env::set_var(ENV_INTERNET_STATUS, "DOWN");
        let (probe, calls) = counting_probe(true);
        let health = InternetHealth::with_probe(Duration::from_secs(30), probe);
        assert_eq!(health.check(), InternetStatus::Down);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        std::env::remove_var(ENV_INTERNET_STATUS);
    }

    #[test]
    fn probes_once_then_caches_within_ttl() {
        std::env::remove_var(ENV_INTERNET_STATUS);
        let (probe, calls) = counting_probe(true);
        let health = InternetHealth::with_probe(Duration::from_secs(30), probe);
        assert_eq!(health.check(), InternetStatus::Ok);
        assert_eq!(health.check(), InternetStatus::Ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reprobes_after_ttl_expires() {
        std::env::remove_var(ENV_INTERNET_STATUS);
        let (probe, calls) = counting_probe(false);
        let health = InternetHealth::with_probe(Duration::from_millis(1), probe);
        assert_eq!(health.check(), InternetStatus::Down);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(health.check(), InternetStatus::Down);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn probe_failure_yields_down() {
        std::env::remove_var(ENV_INTERNET_STATUS);
        let (probe, _calls) = counting_probe(false);
        let health = InternetHealth::with_probe(Duration::from_secs(30), probe);
        assert_eq!(health.check(), InternetStatus::Down);
    }
}
