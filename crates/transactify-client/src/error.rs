use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const CONVERT_HELP_COMMAND: &str = "transactify convert --help";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `transactify {cmd} --help` for usage."),
            None => "Run `transactify --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn source_dir_unresolved() -> Self {
        Self::invalid_argument_with_recovery(
            "Could not resolve a home directory to locate the default Downloads folder.",
            vec![
                "Pass the statements folder explicitly with `--path <dir>`.".to_string(),
                "Or set `TRANSACTIFY_SOURCE_DIR` to the folder holding your exports.".to_string(),
            ],
        )
    }

    /// A required spreadsheet column or OFX element is absent.
    pub fn schema_violation(file: &Path, detail: &str) -> Self {
        let location = file.display().to_string();
        Self::new(
            "schema_violation",
            &format!("`{location}` does not match the expected layout: {detail}"),
            vec![
                "Re-download the export from your brokerage without editing its columns."
                    .to_string(),
                format!("Move `{location}` out of the folder to convert the remaining files."),
            ],
        )
        .with_data(json!({
            "file": location,
            "detail": detail,
        }))
    }

    pub fn missing_columns(file: &Path, missing: Vec<String>, actual: Vec<String>) -> Self {
        let location = file.display().to_string();
        Self::new(
            "schema_violation",
            &format!(
                "`{location}` is missing required columns: {}",
                missing.join(", ")
            ),
            vec![
                "Export the activity sheet with all default columns enabled.".to_string(),
                format!("Run `{CONVERT_HELP_COMMAND}` to review the expected columns."),
            ],
        )
        .with_data(json!({
            "file": location,
            "missing_columns": missing,
            "actual_columns": actual,
        }))
    }

    /// A value is present but cannot be read (date, amount, OFX markup).
    pub fn parse_failure(file: &Path, detail: &str) -> Self {
        let location = file.display().to_string();
        Self::new(
            "parse_failure",
            &format!("Could not read `{location}`: {detail}"),
            vec![
                "Check that the file is a complete, unmodified export.".to_string(),
                format!("Move `{location}` out of the folder to convert the remaining files."),
            ],
        )
        .with_data(json!({
            "file": location,
            "detail": detail,
        }))
    }

    pub fn cell_parse_failure(file: &Path, row: usize, column: &str, detail: &str) -> Self {
        let location = file.display().to_string();
        Self::new(
            "parse_failure",
            &format!("Row {row} of `{location}` has an unreadable `{column}` value: {detail}"),
            vec![
                format!("Fix the `{column}` cell in row {row} or re-download the export."),
                format!("Run `{CONVERT_HELP_COMMAND}` to review accepted value formats."),
            ],
        )
        .with_data(json!({
            "file": location,
            "row": row,
            "column": column,
            "detail": detail,
        }))
    }

    pub fn filesystem_failure(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "filesystem_failure",
            &format!("Filesystem operation failed at `{location}`: {detail}"),
            vec![format!(
                "Grant read/write access to `{location}` or choose another folder with `--path`."
            )],
        )
        .with_data(json!({
            "path": location,
        }))
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn is_internal(&self) -> bool {
        self.code.starts_with("internal_") || self.code == "filesystem_failure"
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::ClientError;

    #[test]
    fn missing_columns_lists_every_absent_column() {
        let error = ClientError::missing_columns(
            Path::new("/tmp/activity.xlsx"),
            vec!["Price".to_string(), "Symbol".to_string()],
            vec!["Net Amount".to_string()],
        );

        assert_eq!(error.code, "schema_violation");
        assert!(error.message.contains("Price, Symbol"));
        let data = error.data.unwrap_or_default();
        assert_eq!(data["missing_columns"][1], "Symbol");
        assert_eq!(data["actual_columns"][0], "Net Amount");
    }

    #[test]
    fn filesystem_and_serialization_failures_are_internal() {
        assert!(ClientError::filesystem_failure(Path::new("/x"), "denied").is_internal());
        assert!(ClientError::internal_serialization("boom").is_internal());
        assert!(!ClientError::parse_failure(Path::new("/x"), "bad").is_internal());
        assert!(!ClientError::invalid_argument_for_command("bad flag", None).is_internal());
    }

    #[test]
    fn command_hint_is_attached_to_invalid_arguments() {
        let error = ClientError::invalid_argument_for_command("bad", Some("convert"));
        assert_eq!(error.recovery_steps[0], "Run `transactify convert --help` for usage.");
        let data = error.data.unwrap_or_default();
        assert_eq!(data["command_hint"], "convert");
    }
}
