//! Output formatting for the CLI (spec.md §6.7).

use serde::Serialize;

/// Output format selected by the `--json` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Pretty-printed JSON output.
    Json,
}

impl OutputFormat {
    /// Select a format from the `--json` flag.
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Print a success message (text mode only).
pub fn success(message: &str) {
    println!("[ok] {message}");
}

/// Print an error message (text mode only).
pub fn error(message: &str) {
    eprintln!("[error] {message}");
}

/// Print a key-value pair (text mode only).
pub fn key_value(key: &str, value: &str) {
    println!("  {key}: {value}");
}

/// Print a value as pretty JSON.
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Uniform success/failure envelope every subcommand prints, in either
/// format.
#[derive(Debug, Serialize)]
pub struct CommandResult<T: Serialize> {
    /// Whether the command succeeded.
    pub success: bool,
    /// Result payload, when successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message, when unsuccessful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    /// Build a successful result.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Build a failed result.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Print the result in the given format. Text mode defers to the
    /// caller's own key/value printing via `data`; only the error path is
    /// rendered here since `T`'s text shape varies per command.
    pub fn print(&self, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Json => json(self),
            OutputFormat::Text => {
                if let Some(err) = &self.error {
                    error(err);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_result_carries_no_data() {
        let result: CommandResult<()> = CommandResult::failure("boom");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("boom"));
    }

    #[test]
    fn success_result_carries_data() {
        let result = CommandResult::success(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
    }
}
