//! Decision Trace emission (spec.md §4.7, §6.6).
//!
//! Traces are written fire-and-forget: a full channel or a closed
//! subscriber never blocks or fails the caller (spec.md §7 "Propagation
//! policy" — only invalid request shape propagates to the caller).

use denis_contracts::DecisionTrace;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Default channel capacity; oldest unread traces are dropped once full,
/// never the emitting request.
const DEFAULT_CAPACITY: usize = 1024;

/// Fire-and-forget sink for [`DecisionTrace`] records.
///
/// Cloning shares the same underlying channel (`broadcast::Sender` is
/// `Clone` and cheap), matching the router's need to hand a sink to every
/// concurrent request without synchronization.
#[derive(Clone)]
pub struct TraceSink {
    tx: broadcast::Sender<DecisionTrace>,
}

impl Default for TraceSink {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TraceSink {
    /// Build a sink with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to emitted traces, e.g. for persistence to a property
    /// graph or the rolling metrics store's audit trail.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DecisionTrace> {
        self.tx.subscribe()
    }

    /// Emit a trace. Best-effort: logs at `debug` on success, `warn` if
    /// there are no subscribers or the channel is lagging, and never
    /// returns an error to the caller.
    pub fn emit(&self, trace: DecisionTrace) {
        info!(
            kind = ?trace.kind,
            mode = ?trace.mode,
            engine = trace.engine.as_deref().unwrap_or(""),
            reason = trace.reason.as_deref().unwrap_or(""),
            "decision_trace"
        );
        if let Err(err) = self.tx.send(trace) {
            warn!(error = %err, "decision trace sink has no active subscribers");
        }
    }
}
