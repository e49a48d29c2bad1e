//! Cooperative cancellation signal threaded through every adapter call
//! (spec.md §5 "Cancellation and timeouts", §7 Cancellation, §8.3).

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Caller-held handle to trigger cancellation for a single in-flight
/// request. Cheap to clone; signaling is idempotent.
#[derive(Debug, Clone)]
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

impl CancellationSource {
    /// Create a fresh, not-yet-cancelled source and its paired token.
    #[must_use]
    pub fn new() -> (Self, CancellationToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancellationToken { rx })
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Adapter-side handle: cheap to clone, read-only. Race this against an
/// in-flight call and stop as soon as it fires.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    /// A token that never fires, for call sites with no caller-side
    /// cancellation signal (direct adapter unit tests, the legacy
    /// heuristic path).
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// `true` once cancellation has been signaled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signaled; returns immediately if it
    /// already has been.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Maps a caller-supplied `cancel_key` to the source for its in-flight
/// request, so an out-of-band cancel signal can reach the router's attempt
/// loop (spec.md §3.3 `cancel_key`).
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    sources: Arc<Mutex<HashMap<String, CancellationSource>>>,
}

impl CancellationRegistry {
    /// Build an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a request's cancellation source under `cancel_key`
    /// (when present) and return the token to thread through its adapter
    /// calls. A request with no `cancel_key` gets a token nothing outside
    /// the router can ever reach.
    #[must_use]
    pub fn register(&self, cancel_key: Option<&str>) -> CancellationToken {
        let (source, token) = CancellationSource::new();
        if let Some(key) = cancel_key {
            self.sources.lock().insert(key.to_string(), source);
        }
        token
    }

    /// Signal cancellation for `cancel_key`, if a request is currently
    /// tracked under it. Returns `true` if a matching request was found.
    pub fn cancel(&self, cancel_key: &str) -> bool {
        self.sources.lock().get(cancel_key).is_some_and(|source| {
            source.cancel();
            true
        })
    }

    /// Stop tracking `cancel_key` once its request has finished.
    pub fn unregister(&self, cancel_key: &str) {
        self.sources.lock().remove(cancel_key);
    }
}
