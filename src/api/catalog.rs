use super::{build_url_with_base, ApiError, BankProduct, Segment};
use crate::APP_USER_AGENT;
use anyhow::Context;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::instrument;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Read-only access to the `bank_products` table through the REST gateway of
/// the hosted database, authorized with the public key.
#[derive(Clone)]
pub struct ProductCatalog {
    client: Client,
    base_url: String,
    anon_key: SecretString,
}

impl std::fmt::Debug for ProductCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductCatalog")
            .field("base_url", &self.base_url)
            .field("anon_key", &"***")
            .finish()
    }
}

impl ProductCatalog {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, anon_key: SecretString) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build the catalog HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    /// Products offered to `segment`, sorted by name.
    ///
    /// # Errors
    /// Returns an error if the request fails or the rows cannot be decoded.
    #[instrument(skip(self), fields(segment = %segment))]
    pub async fn products_for(&self, segment: Segment) -> Result<Vec<BankProduct>, ApiError> {
        let url = build_url_with_base(&self.base_url, "/rest/v1/bank_products");
        let cluster = format!("eq.{}", segment.label());
        let key = self.anon_key.expose_secret();

        let response = self
            .client
            .get(url)
            .query(&[
                ("select", "*"),
                ("cluster_name", cluster.as_str()),
                ("order", "product_name.asc"),
            ])
            .header("apikey", key)
            .bearer_auth(key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_body(status.as_u16(), &body));
        }
        response
            .json()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode products: {err}")))
    }
}
