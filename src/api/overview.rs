//! Page summaries assembled from the backend's raw listings.

use super::{AnalyticsClient, ApiError};
use crate::upload::Record;
use serde_json::Value;

/// Figures on the dashboard cards plus the recent activity feed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overview {
    pub total_customers: usize,
    pub uploaded_files: usize,
    /// Date of the most recent segmentation run, if there was one.
    pub last_segmentation: Option<String>,
    pub messages_sent: usize,
    pub activity: Vec<Record>,
}

impl Overview {
    #[must_use]
    pub fn last_segmentation_label(&self) -> &str {
        self.last_segmentation.as_deref().unwrap_or("Never")
    }
}

/// Everything the history page lists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryListing {
    pub uploads: Vec<Record>,
    pub segmentations: Vec<Record>,
    pub campaigns: Vec<Record>,
}

fn text<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

/// Calendar date of a `created_date` timestamp; other values pass through.
fn date_part(timestamp: &str) -> String {
    timestamp
        .split_once('T')
        .map_or(timestamp, |(date, _)| date)
        .to_string()
}

impl AnalyticsClient {
    /// Loads the five dashboard listings concurrently. Any failure fails the
    /// whole overview.
    ///
    /// # Errors
    /// Returns the first listing error.
    pub async fn overview(&self) -> Result<Overview, ApiError> {
        let (customers, uploads, latest, campaigns, activity) = tokio::try_join!(
            self.customers(),
            self.uploads(),
            self.latest_segmentation(),
            self.campaigns(),
            self.activity(),
        )?;

        Ok(Overview {
            total_customers: customers.len(),
            uploaded_files: uploads.len(),
            last_segmentation: latest
                .first()
                .and_then(|run| text(run, "created_date"))
                .map(date_part),
            messages_sent: campaigns
                .iter()
                .filter(|campaign| text(campaign, "status") == Some("sent"))
                .count(),
            activity,
        })
    }

    /// # Errors
    /// Returns the first listing error.
    pub async fn history(&self) -> Result<HistoryListing, ApiError> {
        let (uploads, segmentations, campaigns) =
            tokio::try_join!(self.uploads(), self.segmentations(), self.campaigns())?;
        Ok(HistoryListing {
            uploads,
            segmentations,
            campaigns,
        })
    }
}

/// One printable line for a listing row: its name-like field and status.
#[must_use]
pub fn describe(record: &Record) -> String {
    let name = ["name", "campaign_name", "file_name", "description", "id"]
        .into_iter()
        .find_map(|key| text(record, key))
        .unwrap_or("(unnamed)");
    match text(record, "status") {
        Some(status) => format!("{name} [{status}]"),
        None => name.to_string(),
    }
}
