//! # Denis Telemetry
//!
//! Decision Trace emission, the Rolling Metrics Store, and `tracing`
//! setup for the Denis inference control plane (spec.md §3.7, §4.7, §6.6;
//! SPEC_FULL.md §2.1, §3.8).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod metrics_store;
pub mod trace_sink;
pub mod tracing_setup;

pub use metrics_store::{EngineStats, MetricsStore};
pub use trace_sink::TraceSink;
pub use tracing_setup::{init_tracing, TracingConfig, TracingError};
