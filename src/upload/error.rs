use crate::api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload a CSV file ({name} is not one)")]
    UnsupportedFile { name: String },
    #[error("Error processing file: {0}")]
    Csv(#[from] csv::Error),
    #[error("Error processing file: {0}")]
    Extraction(String),
    #[error("No valid rows to save")]
    NothingToSave,
    #[error("Error saving to database: {0}")]
    Save(#[from] ApiError),
}

impl UploadError {
    /// True for errors raised before any extraction or network call.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::UnsupportedFile { .. } | Self::NothingToSave)
    }
}
