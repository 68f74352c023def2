use super::Record;
use crate::auth::utils::{normalize_email, valid_email};
use serde_json::Value;

/// A row is usable only when all of these hold a value.
pub const REQUIRED_COLUMNS: [&str; 3] = ["customer_id", "name", "email"];
pub const PREVIEW_ROWS: usize = 3;
pub const MAX_VISIBLE_ERRORS: usize = 5;

const MISSING_FIELDS: &str = "Missing required fields in some rows";
const INVALID_EMAIL: &str = "Invalid email format detected";

/// Outcome of validating one upload. Never mutated after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadValidationReport {
    rows_processed: usize,
    valid_rows: Vec<Record>,
    error_rows: usize,
    error_messages: Vec<String>,
    preview: Vec<Record>,
}

impl UploadValidationReport {
    #[must_use]
    pub fn validate(rows: Vec<Record>) -> Self {
        let rows_processed = rows.len();
        let malformed_email = rows.iter().any(has_malformed_email);
        let valid_rows: Vec<Record> = rows.into_iter().filter(is_valid).collect();
        let error_rows = rows_processed - valid_rows.len();

        let mut error_messages = Vec::new();
        if error_rows > 0 {
            error_messages.push(MISSING_FIELDS.to_string());
            if malformed_email {
                error_messages.push(INVALID_EMAIL.to_string());
            }
        }

        let preview = valid_rows.iter().take(PREVIEW_ROWS).cloned().collect();

        Self {
            rows_processed,
            valid_rows,
            error_rows,
            error_messages,
            preview,
        }
    }

    #[must_use]
    pub fn rows_processed(&self) -> usize {
        self.rows_processed
    }

    #[must_use]
    pub fn valid_rows(&self) -> &[Record] {
        &self.valid_rows
    }

    #[must_use]
    pub fn error_rows(&self) -> usize {
        self.error_rows
    }

    #[must_use]
    pub fn error_messages(&self) -> &[String] {
        &self.error_messages
    }

    #[must_use]
    pub fn preview(&self) -> &[Record] {
        &self.preview
    }

    /// Whole percent of valid rows, rounded half up; 0 for an empty upload.
    #[must_use]
    pub fn success_rate(&self) -> usize {
        if self.rows_processed == 0 {
            return 0;
        }
        (self.valid_rows.len() * 100 + self.rows_processed / 2) / self.rows_processed
    }

    /// At most [`MAX_VISIBLE_ERRORS`] messages, then a count of the rest.
    #[must_use]
    pub fn visible_errors(&self) -> Vec<String> {
        let mut visible: Vec<String> = self
            .error_messages
            .iter()
            .take(MAX_VISIBLE_ERRORS)
            .cloned()
            .collect();
        let hidden = self.error_messages.len().saturating_sub(MAX_VISIBLE_ERRORS);
        if hidden > 0 {
            visible.push(format!("... and {hidden} more errors"));
        }
        visible
    }

    #[must_use]
    pub fn status_line(&self) -> String {
        if self.error_rows == 0 {
            "All rows processed successfully! Your customer data is ready to be saved to the database."
                .to_string()
        } else {
            format!(
                "{} rows had validation errors. Valid rows can still be saved to the database.",
                self.error_rows
            )
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(_) => true,
    }
}

fn is_valid(row: &Record) -> bool {
    REQUIRED_COLUMNS
        .iter()
        .all(|column| is_present(row.get(*column)))
}

fn has_malformed_email(row: &Record) -> bool {
    match row.get("email") {
        Some(Value::String(email)) if !email.trim().is_empty() => {
            !valid_email(&normalize_email(email))
        }
        Some(Value::Null | Value::String(_)) | None => false,
        Some(_) => true,
    }
}
