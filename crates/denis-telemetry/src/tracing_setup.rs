//! Structured logging setup (spec.md §9 Design Notes; SPEC_FULL.md §2.1).
//!
//! `tracing` + `tracing-subscriber` only: every async boundary
//! (`#[instrument]` on adapter calls, router attempts, scheduler
//! assignment) is carried by spans, with `request_id`/`engine_id`/
//! `attempt`/`trace_id` as structured fields — never message bodies or
//! secrets.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration, read once at process start.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit newline-delimited JSON instead of the human-readable format.
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl TracingConfig {
    /// Build a configuration with the given default filter directive.
    #[must_use]
    pub fn new(log_level: impl Into<String>) -> Self {
        Self {
            log_level: log_level.into(),
            ..Default::default()
        }
    }

    /// Switch to JSON output, for production deployments.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Initialize the global `tracing` subscriber. Idempotent within a
/// process: a second call is a no-op (returns `Err`, which callers should
/// ignore outside of `main`/test setup).
///
/// # Errors
/// Returns [`TracingError::Init`] if a global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TracingError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = if config.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_filter(filter))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_filter(filter))
            .try_init()
    };

    result.map_err(|err| TracingError::Init(err.to_string()))
}

/// Tracing initialization error.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// A global subscriber was already installed.
    #[error("failed to initialize tracing: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = TracingConfig::new("debug").with_json(true);
        assert_eq!(config.log_level, "debug");
        assert!(config.json);
    }

    #[test]
    fn default_is_human_readable_info() {
        let config = TracingConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json);
    }
}
