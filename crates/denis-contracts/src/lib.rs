//! # Denis Contracts
//!
//! The `DecisionTrace` wire schema shared between `denis-routing` (which
//! emits traces) and `denis-telemetry` (which writes and aggregates them),
//! per spec.md §4.7, §6.6.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decision_trace;

pub use decision_trace::{Confidence, DecisionTrace, IllegalModeError, TraceKind, TraceMode};
