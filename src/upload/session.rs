use super::{
    ensure_csv, CsvExtractor, RowExtractor, UploadError, UploadFile, UploadValidationReport,
};
use crate::api::{AnalyticsClient, SegmentAndStoreResponse};
use tracing::{info, instrument, warn};

/// The upload page: at most one chosen file and its report.
#[derive(Debug, Default)]
pub struct UploadSession<E = CsvExtractor> {
    extractor: E,
    file: Option<UploadFile>,
    report: Option<UploadValidationReport>,
    saved: Option<SegmentAndStoreResponse>,
}

impl<E: RowExtractor> UploadSession<E> {
    #[must_use]
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            file: None,
            report: None,
            saved: None,
        }
    }

    #[must_use]
    pub fn file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    #[must_use]
    pub fn report(&self) -> Option<&UploadValidationReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn saved(&self) -> Option<&SegmentAndStoreResponse> {
        self.saved.as_ref()
    }

    /// Saving needs at least one valid row and happens once per file.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.saved.is_none()
            && self
                .report
                .as_ref()
                .is_some_and(|report| !report.valid_rows().is_empty())
    }

    /// Replaces the current file. The previous report is discarded first, so
    /// a rejected file leaves the page empty.
    ///
    /// # Errors
    /// Returns [`UploadError::UnsupportedFile`] for non-CSV files (nothing is
    /// extracted) or the extraction error.
    #[instrument(skip_all, fields(file = %file.name))]
    pub async fn choose(&mut self, file: UploadFile) -> Result<&UploadValidationReport, UploadError> {
        self.clear();
        ensure_csv(&file)?;

        let rows = self.extractor.extract(&file).await?;
        let report = UploadValidationReport::validate(rows);
        info!(
            rows = report.rows_processed(),
            valid = report.valid_rows().len(),
            errors = report.error_rows(),
            "upload validated"
        );

        self.file = Some(file);
        Ok(self.report.insert(report))
    }

    /// Sends the chosen file to the backend for segmentation and storage.
    ///
    /// # Errors
    /// Returns [`UploadError::NothingToSave`] without a valid row, otherwise
    /// the backend error.
    #[instrument(skip_all)]
    pub async fn save(&mut self, api: &AnalyticsClient) -> Result<&SegmentAndStoreResponse, UploadError> {
        if !self.can_save() {
            return Err(UploadError::NothingToSave);
        }
        let file = self.file.as_ref().ok_or(UploadError::NothingToSave)?;

        let stored = api
            .segment_and_store(&file.name, file.bytes.clone())
            .await
            .inspect_err(|err| warn!("Failed to store upload: {err}"))?;
        for (table, cluster) in &stored.clusters {
            if !cluster.succeeded() {
                warn!(table = %table, error = ?cluster.error, "segment table not stored");
            }
        }

        Ok(self.saved.insert(stored))
    }

    pub fn clear(&mut self) {
        self.file = None;
        self.report = None;
        self.saved = None;
    }
}
