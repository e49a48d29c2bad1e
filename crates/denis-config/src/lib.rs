//! # Denis Config
//!
//! Environment-driven configuration for the Denis inference control plane
//! (spec.md §6.5).
//!
//! [`DenisConfig`] is parsed once, at process start, from `std::env::var`
//! reads with typed defaults. Nothing downstream re-reads the environment
//! per request.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use denis_core::InternetStatus;
use std::time::Duration;
use thiserror::Error;

/// `DENIS_INTERNET_STATUS` — forces [`InternetHealth`](denis_core::InternetStatus)
/// to a fixed value regardless of cache or connectivity (spec.md §4.2, §6.5).
pub const ENV_INTERNET_STATUS: &str = "DENIS_INTERNET_STATUS";
/// `DENIS_ALLOW_BOOSTERS` — `1` permits booster selection when health is `OK`.
pub const ENV_ALLOW_BOOSTERS: &str = "DENIS_ALLOW_BOOSTERS";
/// `DENIS_ROUTER_MAX_ATTEMPTS` — upper bound on attempts per request.
pub const ENV_ROUTER_MAX_ATTEMPTS: &str = "DENIS_ROUTER_MAX_ATTEMPTS";
/// `DENIS_ROUTER_DEFAULT_TIMEOUT_SEC` — default per-attempt timeout when no plan is supplied.
pub const ENV_ROUTER_DEFAULT_TIMEOUT_SEC: &str = "DENIS_ROUTER_DEFAULT_TIMEOUT_SEC";
/// `DENIS_STRICT_ENGINE_REGISTRY` — `1` fails registry load on an unknown provider family.
pub const ENV_STRICT_ENGINE_REGISTRY: &str = "DENIS_STRICT_ENGINE_REGISTRY";
/// `DENIS_ENABLE_INFERENCE_GATEWAY` — one of two flags gating shadow comparison.
pub const ENV_ENABLE_INFERENCE_GATEWAY: &str = "DENIS_ENABLE_INFERENCE_GATEWAY";
/// `DENIS_GATEWAY_SHADOW_MODE` — the other flag gating shadow comparison.
pub const ENV_GATEWAY_SHADOW_MODE: &str = "DENIS_GATEWAY_SHADOW_MODE";
/// `DENIS_GATEWAY_SHADOW_TIMEOUT_MS` — bound on the shadow hook's own latency.
pub const ENV_GATEWAY_SHADOW_TIMEOUT_MS: &str = "DENIS_GATEWAY_SHADOW_TIMEOUT_MS";
/// `DENIS_OPENAI_COMPAT_MAX_HOP` — maximum accepted loop-guard hop value.
pub const ENV_OPENAI_COMPAT_MAX_HOP: &str = "DENIS_OPENAI_COMPAT_MAX_HOP";

/// Errors raised while parsing configuration from the environment.
#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    /// A variable was set but could not be parsed as the expected type.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Name of the offending environment variable.
        var: &'static str,
        /// The raw value read.
        value: String,
    },
}

/// Parsed, immutable process configuration (spec.md §6.5).
#[derive(Debug, Clone)]
pub struct DenisConfig {
    /// Forced Internet Health value, if `DENIS_INTERNET_STATUS` is set.
    pub internet_status_override: Option<InternetStatus>,
    /// Whether the scheduler may select boosters when health is `OK`. Default `true`.
    pub allow_boosters: bool,
    /// Upper bound on attempts per request. Default `3`.
    pub router_max_attempts: u32,
    /// Default per-attempt timeout when the caller supplies no plan.
    pub router_default_timeout: Duration,
    /// `true` fails registry load at an unknown provider family instead of dropping it.
    pub strict_engine_registry: bool,
    /// `true` enables the Gateway Router shadow hook (still gated by `gateway_shadow_mode`).
    pub enable_inference_gateway: bool,
    /// `true` enables shadow comparison (still gated by `enable_inference_gateway`).
    pub gateway_shadow_mode: bool,
    /// Wall-clock bound on the shadow hook's own work.
    pub gateway_shadow_timeout: Duration,
    /// Maximum accepted inbound loop-guard hop value.
    pub openai_compat_max_hop: u32,
}

impl Default for DenisConfig {
    fn default() -> Self {
        Self {
            internet_status_override: None,
            allow_boosters: true,
            router_max_attempts: 3,
            router_default_timeout: Duration::from_secs(5),
            strict_engine_registry: false,
            enable_inference_gateway: false,
            gateway_shadow_mode: false,
            gateway_shadow_timeout: Duration::from_millis(100),
            openai_compat_max_hop: 8,
        }
    }
}

impl DenisConfig {
    /// Parse configuration from the process environment, falling back to
    /// [`DenisConfig::default`] defaults for anything unset.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] if a variable is set to a
    /// value that cannot be parsed as its expected type.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            internet_status_override: parse_optional(ENV_INTERNET_STATUS, |raw| {
                InternetStatus::parse(raw).ok_or(())
            })?,
            allow_boosters: parse_bool(ENV_ALLOW_BOOSTERS, defaults.allow_boosters)?,
            router_max_attempts: parse_u32(ENV_ROUTER_MAX_ATTEMPTS, defaults.router_max_attempts)?,
            router_default_timeout: parse_u32(
                ENV_ROUTER_DEFAULT_TIMEOUT_SEC,
                defaults.router_default_timeout.as_secs() as u32,
            )
            .map(|secs| Duration::from_secs(u64::from(secs)))?,
            strict_engine_registry: parse_bool(
                ENV_STRICT_ENGINE_REGISTRY,
                defaults.strict_engine_registry,
            )?,
            enable_inference_gateway: parse_bool(
                ENV_ENABLE_INFERENCE_GATEWAY,
                defaults.enable_inference_gateway,
            )?,
            gateway_shadow_mode: parse_bool(ENV_GATEWAY_SHADOW_MODE, defaults.gateway_shadow_mode)?,
            gateway_shadow_timeout: parse_u32(
                ENV_GATEWAY_SHADOW_TIMEOUT_MS,
                defaults.gateway_shadow_timeout.as_millis() as u32,
            )
            .map(|ms| Duration::from_millis(u64::from(ms)))?,
            openai_compat_max_hop: parse_u32(
                ENV_OPENAI_COMPAT_MAX_HOP,
                defaults.openai_compat_max_hop,
            )?,
        })
    }

    /// `true` iff both shadow-mode flags are set (spec.md §6.5: "both required").
    #[must_use]
    pub fn shadow_comparison_enabled(&self) -> bool {
        self.enable_inference_gateway && self.gateway_shadow_mode
    }
}

fn parse_bool(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.as_str() {
            "1" | "true" | "TRUE" => Ok(true),
            "0" | "false" | "FALSE" => Ok(false),
            _ => Err(ConfigError::InvalidValue { var, value: raw }),
        },
    }
}

fn parse_u32(var: &'static str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}

fn parse_optional<T>(
    var: &'static str,
    parse: impl FnOnce(&str) -> Result<T, ()>,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(None),
        Ok(raw) => parse(&raw)
            .map(Some)
            .map_err(|()| ConfigError::InvalidValue { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variable mutation races across tests in the same process;
    // serialize the handful of tests that touch it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_spec() {
        let _guard = ENV_LOCK.lock().unwrap();
        for var in [
            ENV_INTERNET_STATUS,
            ENV_ALLOW_BOOSTERS,
            ENV_ROUTER_MAX_ATTEMPTS,
            ENV_ROUTER_DEFAULT_TIMEOUT_SEC,
            ENV_STRICT_ENGINE_REGISTRY,
            ENV_ENABLE_INFERENCE_GATEWAY,
            ENV_GATEWAY_SHADOW_MODE,
            ENV_GATEWAY_SHADOW_TIMEOUT_MS,
            ENV_OPENAI_COMPAT_MAX_HOP,
        ] {
            std::env::remove_var(var);
        }

        let config = DenisConfig::from_env().expect("defaults must parse");
        assert!(config.internet_status_override.is_none());
        assert!(config.allow_boosters);
        assert_eq!(config.router_max_attempts, 3);
        assert_eq!(config.gateway_shadow_timeout, Duration::from_millis(100));
        assert!(!config.shadow_comparison_enabled());
    }

    #[test]
    fn internet_status_override_parses_uppercase() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_INTERNET_STATUS, "DOWN");
        let config = DenisConfig::from_env().expect("should parse");
        assert_eq!(config.internet_status_override, Some(InternetStatus::Down));
        std::env::remove_var(ENV_INTERNET_STATUS);
    }

    #[test]
    fn shadow_comparison_requires_both_flags() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_ENABLE_INFERENCE_GATEWAY, "1");
        std::env::remove_var(ENV_GATEWAY_SHADOW_MODE);
        let config = DenisConfig::from_env().expect("should parse");
        assert!(!config.shadow_comparison_enabled());

        std::env::set_var(ENV_GATEWAY_SHADOW_MODE, "1");
        let config = DenisConfig::from_env().expect("should parse");
        assert!(config.shadow_comparison_enabled());

        std::env::remove_var(ENV_ENABLE_INFERENCE_GATEWAY);
        std::env::remove_var(ENV_GATEWAY_SHADOW_MODE);
    }

    #[test]
    fn invalid_bool_is_rejected() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_ALLOW_BOOSTERS, "maybe");
        assert!(DenisConfig::from_env().is_err());
        std::env::remove_var(ENV_ALLOW_BOOSTERS);
    }
}
