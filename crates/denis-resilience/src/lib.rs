//! # Denis Resilience
//!
//! Per-attempt backoff and retry-condition classification for the Denis
//! router (spec.md §4.6, §5).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod retry;

pub use retry::{classify_failure, should_advance, BackoffConfig, BackoffPolicy};
