//! Clients for the analytics backend (segmentation, campaigns, dashboard
//! figures) and for the product catalog table.
//!
//! The backend is called without an auth header; it does not check one.

mod catalog;
mod client;
mod error;
mod overview;
mod types;

pub use catalog::ProductCatalog;
pub use client::{AnalyticsClient, DEFAULT_API_URL};
pub use error::ApiError;
pub use overview::{describe as describe_record, HistoryListing, Overview};
pub use types::{
    BankProduct, CampaignLog, CampaignStartRequest, CampaignStartResponse, ClusterResult,
    CustomerCounts, DashboardStats, Health, RecentCampaigns, SegmentAndStoreResponse, Segment,
    TriggerPayload, TriggerResponse,
};

/// Trims a base URL and joins `path` onto it with exactly one slash.
pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::build_url_with_base;

    #[test]
    fn joins_with_single_slash() {
        assert_eq!(
            build_url_with_base("http://localhost:8000/", "/health"),
            "http://localhost:8000/health"
        );
        assert_eq!(
            build_url_with_base(" http://api ", "customers/"),
            "http://api/customers/"
        );
        assert_eq!(build_url_with_base("", "/health"), "/health");
    }
}
