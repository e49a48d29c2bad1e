//! # denis-routing
//!
//! The Scheduler, Gateway Router, and Router executor for the denis
//! inference control plane (spec.md §4.4–§4.6, §4.9).
//!
//! This crate turns an [`denis_core::InferenceRequest`] into an
//! [`denis_core::InferencePlan`] (the [`Scheduler`], local-first) and then
//! executes that plan against the [`denis_core::EngineRegistry`] and the
//! provider adapters (the [`Router`]), falling back to a legacy heuristic
//! scorer when no plan is supplied. An optional [`GatewayRouter`] resolves
//! `(intent, phase)` task profiles from seed tables and can run alongside
//! the real decision as a shadow comparison.
//!
//! Neither the Scheduler nor the Router ever execute inference directly;
//! both delegate every provider call to a [`denis_core::ProviderAdapter`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod gateway_router;
pub mod query_profile;
pub mod router;
pub mod scheduler;
pub mod seed;

pub use gateway_router::{GatewayRouter, ResolvedRoute};
pub use query_profile::{classify_query, QueryProfile};
pub use router::Router;
pub use scheduler::{AssignOutcome, Scheduler};
pub use seed::{BudgetOverride, RoutingRule, Strategy};
