//! Shared Internet Health status type (spec.md §3.2).
//!
//! The probe/cache/TTL logic lives in the `denis-health` crate; this enum is
//! data-model only, so every crate that needs to read or stamp a status
//! (scheduler, router, envelope, traces) can depend on `denis-core` alone.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `{OK, DOWN, UNKNOWN}` (spec.md §3.2). `Unknown` only occurs when forced
/// by an env override (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InternetStatus {
    /// Reachable.
    Ok,
    /// Unreachable.
    Down,
    /// Not determined (override-only state).
    Unknown,
}

impl InternetStatus {
    /// Parse one of the three legal override values
    /// (`DENIS_INTERNET_STATUS`, spec.md §4.2). `None` on anything else.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "OK" => Some(Self::Ok),
            "DOWN" => Some(Self::Down),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// True when boosters may be selected against this status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for InternetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::Down => "DOWN",
            Self::Unknown => "UNKNOWN",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_legal_values() {
        assert_eq!(InternetStatus::parse("OK"), Some(InternetStatus::Ok));
        assert_eq!(InternetStatus::parse("DOWN"), Some(InternetStatus::Down));
        assert_eq!(InternetStatus::parse("UNKNOWN"), Some(InternetStatus::Unknown));
        assert_eq!(InternetStatus::parse("banana"), None);
    }

    #[test]
    fn only_ok_is_ok() {
        assert!(InternetStatus::Ok.is_ok());
        assert!(!InternetStatus::Down.is_ok());
        assert!(!InternetStatus::Unknown.is_ok());
    }
}
