//! # Denis Core
//!
//! Core types, traits, and error handling for the Denis inference control plane.
//!
//! This crate provides the foundational types shared by every other crate in the
//! workspace:
//! - the engine catalog (`Engine`, `EngineRegistry`)
//! - request/plan/result data model (`InferenceRequest`, `InferencePlan`,
//!   `ProviderCallResult`)
//! - the `ProviderAdapter` trait every backend family implements
//! - the response envelope returned by the router
//! - error types and handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cancel;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod health;
pub mod hop;
pub mod plan;
pub mod provider;
pub mod registry;
pub mod request;
pub mod result;
pub mod types;

pub use cancel::{CancellationRegistry, CancellationSource, CancellationToken};
pub use engine::{Engine, EngineBuilder, ProviderFamily, Tag};
pub use envelope::{RouteEnvelope, SkippedEngine};
pub use error::{DenisError, DenisResult};
pub use health::InternetStatus;
pub use plan::{AttemptPolicy, Budget, InferencePlan, InferencePlanBuilder, RetryOn, Timeouts};
pub use provider::ProviderAdapter;
pub use registry::EngineRegistry;
pub use request::{InferenceRequest, InferenceRequestBuilder, Message, RequestPayload};
pub use result::ProviderCallResult;
pub use types::{EngineId, RequestId, SessionId, TraceId};
