//! Customer CSV intake: accept a file, extract its rows, validate them and
//! keep the report until the next file is chosen.

mod error;
mod extract;
mod report;
mod session;

pub use error::UploadError;
pub use extract::{CsvExtractor, RowExtractor};
pub use report::{UploadValidationReport, MAX_VISIBLE_ERRORS, PREVIEW_ROWS, REQUIRED_COLUMNS};
pub use session::UploadSession;

use anyhow::Context;
use std::path::Path;

/// One extracted row: column name to value, in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Columns the segmentation backend reads from an upload.
pub const EXPECTED_COLUMNS: [&str; 14] = [
    "customer_id",
    "name",
    "gender",
    "age",
    "occupation",
    "city",
    "account_type",
    "income",
    "balance",
    "account_tenure",
    "has_loan",
    "has_credit_card",
    "has_investment",
    "last_marketing_response",
];

/// A file picked by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk; the content type is inferred from the extension.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = if has_csv_extension(&name) {
            CSV_CONTENT_TYPE
        } else {
            "application/octet-stream"
        };
        Ok(Self::new(name, content_type, bytes))
    }
}

fn has_csv_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Accepts a file named `*.csv` or typed `text/csv`.
///
/// # Errors
/// Returns [`UploadError::UnsupportedFile`] for anything else.
pub fn ensure_csv(file: &UploadFile) -> Result<(), UploadError> {
    let mime = file
        .content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim();
    if has_csv_extension(&file.name) || mime.eq_ignore_ascii_case(CSV_CONTENT_TYPE) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedFile {
            name: file.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_by_name_or_type() {
        assert!(ensure_csv(&UploadFile::new("customers.CSV", "", Vec::new())).is_ok());
        assert!(ensure_csv(&UploadFile::new("export", "text/csv; charset=utf-8", Vec::new())).is_ok());
        assert!(matches!(
            ensure_csv(&UploadFile::new("customers.xlsx", "application/vnd.ms-excel", Vec::new())),
            Err(UploadError::UnsupportedFile { .. })
        ));
    }
}
