//! Loop-guard hop propagation (spec.md §4.8).
//!
//! "Propagation uses a per-task implicit value so intermediate code need not
//! thread it through every call" (spec.md §9) — a [`tokio::task_local`] is
//! the idiomatic carrier: it is scoped to the request's task and read by
//! every adapter without an explicit parameter.

use std::future::Future;

tokio::task_local! {
    static HOP: u32;
}

/// HTTP header name every outbound adapter request must carry.
pub const HOP_HEADER: &str = "Hop";

/// Run `f` with the inbound hop count scoped to the current task.
pub async fn scope<F, T>(hop: u32, f: F) -> T
where
    F: Future<Output = T>,
{
    HOP.scope(hop, f).await
}

/// Current task's hop count, or `0` if no scope is active (e.g. direct
/// adapter unit tests).
#[must_use]
pub fn current() -> u32 {
    HOP.try_with(|hop| *hop).unwrap_or(0)
}

/// The value to propagate on the *next* outbound hop: current + 1.
#[must_use]
pub fn next() -> u32 {
    current() + 1
}
