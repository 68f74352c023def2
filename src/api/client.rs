use super::{
    build_url_with_base,
    types::CampaignEnvelope,
    ApiError, CampaignLog, CampaignStartRequest, CampaignStartResponse, CustomerCounts,
    DashboardStats, Health, RecentCampaigns, SegmentAndStoreResponse, TriggerPayload,
    TriggerResponse,
};
use crate::upload::{Record, CSV_CONTENT_TYPE};
use crate::APP_USER_AGENT;
use anyhow::Context;
use reqwest::{multipart, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Segmentation runs a model over the whole upload, so requests get a long budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct AnalyticsClient {
    client: Client,
    base_url: String,
}

impl AnalyticsClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build the analytics HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_body(status.as_u16(), &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        self.send(self.client.get(url)).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        self.send(self.client.post(url).json(body)).await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn customers(&self) -> Result<Vec<Record>, ApiError> {
        self.get_json("/customers/").await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn uploads(&self) -> Result<Vec<Record>, ApiError> {
        self.get_json("/uploads/").await
    }

    /// Most recent segmentation run only.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn latest_segmentation(&self) -> Result<Vec<Record>, ApiError> {
        self.get_json("/segmentations?limit=1&order=-created_date")
            .await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn segmentations(&self) -> Result<Vec<Record>, ApiError> {
        self.get_json("/segmentations/").await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn campaigns(&self) -> Result<Vec<Record>, ApiError> {
        self.get_json("/campaigns/").await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn activity(&self) -> Result<Vec<Record>, ApiError> {
        self.get_json("/activity/").await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.get_json("/dashboard/stats").await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn customer_counts(&self) -> Result<CustomerCounts, ApiError> {
        self.get_json("/segments/customer-counts").await
    }

    /// Logs a new campaign; the backend assigns its id.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    #[instrument(skip_all, fields(campaign = %request.campaign_name))]
    pub async fn start_campaign(
        &self,
        request: &CampaignStartRequest,
    ) -> Result<CampaignStartResponse, ApiError> {
        self.post_json("/campaigns/start", request).await
    }

    /// # Errors
    /// Returns an error if the request fails or the response is not JSON.
    pub async fn recent_campaigns(&self, limit: u32) -> Result<RecentCampaigns, ApiError> {
        self.get_json(&format!("/campaigns/recent?limit={limit}"))
            .await
    }

    /// # Errors
    /// Returns an error if the campaign does not exist or the request fails.
    pub async fn campaign(&self, campaign_id: &str) -> Result<CampaignLog, ApiError> {
        let mut url = Url::parse(&self.url("/campaigns/"))
            .map_err(|err| ApiError::Config(format!("invalid API URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Config("API URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push(campaign_id);

        let envelope: CampaignEnvelope = self.send(self.client.get(url)).await?;
        Ok(envelope.campaign)
    }

    /// Forwards the campaign to the workflow webhook through the backend.
    ///
    /// # Errors
    /// Returns an error if the backend or the webhook rejects the trigger.
    #[instrument(skip_all, fields(campaign_id = %payload.campaign_id))]
    pub async fn trigger_campaign(&self, payload: &TriggerPayload) -> Result<TriggerResponse, ApiError> {
        self.post_json("/trigger-n8n-campaign", payload).await
    }

    /// Uploads a CSV for segmentation; rows are stored per segment table.
    ///
    /// # Errors
    /// Returns an error if the upload is rejected or the request fails.
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn segment_and_store(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<SegmentAndStoreResponse, ApiError> {
        let part = multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(CSV_CONTENT_TYPE)
            .map_err(|err| ApiError::Config(format!("Failed to build upload: {err}")))?;
        let form = multipart::Form::new().part("file", part);

        self.send(self.client.post(self.url("/segment-and-store")).multipart(form))
            .await
    }

    /// # Errors
    /// Returns an error if the backend cannot be reached.
    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get_json("/health").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Segment;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    #[tokio::test]
    async fn dashboard_stats_decode() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dashboard/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "total_customers": 120,
                "total_messages_sent": 48,
                "customer_counts": {"Stable Earners": 70, "High-Value Elite": 50}
            })))
            .mount(&server)
            .await;

        let stats = AnalyticsClient::new(&server.uri())?.dashboard_stats().await?;
        assert_eq!(stats.total_customers, 120);
        assert_eq!(stats.customer_counts.get("Stable Earners"), Some(&70));
        Ok(())
    }

    #[tokio::test]
    async fn start_campaign_posts_request() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/campaigns/start"))
            .and(body_json(json!({
                "campaign_name": "Spring",
                "segment_name": "Stable Earners",
                "product_name": "Gold Card"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "campaign_id": "spring_stable_earners_1700000000000",
                "message": "Campaign started successfully"
            })))
            .mount(&server)
            .await;

        let response = AnalyticsClient::new(&server.uri())?
            .start_campaign(&CampaignStartRequest {
                campaign_name: "Spring".to_string(),
                segment_name: Segment::StableEarners.label().to_string(),
                product_name: "Gold Card".to_string(),
                total_customers: None,
            })
            .await?;
        assert_eq!(response.campaign_id, "spring_stable_earners_1700000000000");
        assert!(response.data.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn missing_campaign_surfaces_detail() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/campaigns/spring%201"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Campaign not found"})),
            )
            .mount(&server)
            .await;

        let err = AnalyticsClient::new(&server.uri())?
            .campaign("spring 1")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 404,
                message: "Campaign not found".to_string()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn recent_campaigns_passes_limit() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/campaigns/recent"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "campaigns": [],
                "total": 0
            })))
            .mount(&server)
            .await;

        let recent = AnalyticsClient::new(&server.uri())?
            .recent_campaigns(5)
            .await?;
        assert_eq!(recent.total, 0);
        Ok(())
    }

    #[tokio::test]
    async fn segment_and_store_sends_multipart() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/segment-and-store"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Segmentation successful.",
                "clusters": {"stable_earners": {"processed_count": 2, "status": "success"}}
            })))
            .mount(&server)
            .await;

        let stored = AnalyticsClient::new(&server.uri())?
            .segment_and_store("customers.csv", b"customer_id,name,email\n".to_vec())
            .await?;
        assert_eq!(stored.stored_rows(), 2);

        let requests = server.received_requests().await.unwrap_or_default();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"));
        assert!(requests[0].headers.get("authorization").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn customer_counts_decode_per_segment() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/segments/customer-counts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "customer_counts": {"Affluent Customers": 12},
                "total_customers": 12
            })))
            .mount(&server)
            .await;

        let counts = AnalyticsClient::new(&server.uri())?.customer_counts().await?;
        assert_eq!(counts.count_for(Segment::AffluentCustomers), 12);
        assert_eq!(counts.count_for(Segment::StableEarners), 0);
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_status() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "degraded",
                "message": "model not loaded"
            })))
            .mount(&server)
            .await;

        let health = AnalyticsClient::new(&server.uri())?.health().await?;
        assert!(!health.is_healthy());
        assert_eq!(health.message, "model not loaded");
        assert!(health.endpoints.is_empty());
        Ok(())
    }
}
