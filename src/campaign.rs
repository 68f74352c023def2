//! Campaign launch: validate the form, log the campaign with the backend,
//! then trigger the delivery workflow through the backend proxy.

use crate::api::{
    AnalyticsClient, ApiError, CampaignStartRequest, Segment, TriggerPayload, TriggerResponse,
};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum CampaignError {
    /// Rejected before any request.
    #[error("{0}")]
    Invalid(&'static str),
    #[error("Campaign failed: {0}")]
    Start(#[source] ApiError),
    #[error("Campaign failed: campaign {campaign_id} was logged but the workflow was not triggered: {source}")]
    Trigger {
        campaign_id: String,
        #[source]
        source: ApiError,
    },
}

/// The campaign form as filled in by the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CampaignRequest {
    pub campaign_name: String,
    pub segment: Option<Segment>,
    pub product_name: Option<String>,
}

/// A form that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidCampaign {
    pub campaign_name: String,
    pub segment: Segment,
    pub product_name: String,
}

impl CampaignRequest {
    /// Checks, in order: segment, product, name.
    ///
    /// # Errors
    /// Returns [`CampaignError::Invalid`] with the message for the first
    /// missing field.
    pub fn validate(&self) -> Result<ValidCampaign, CampaignError> {
        let segment = self
            .segment
            .ok_or(CampaignError::Invalid("Please select a customer segment"))?;
        let product_name = self
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(CampaignError::Invalid("Please select a bank product"))?;
        let campaign_name = self.campaign_name.trim();
        if campaign_name.is_empty() {
            return Err(CampaignError::Invalid("Please enter a campaign name"));
        }

        Ok(ValidCampaign {
            campaign_name: campaign_name.to_string(),
            segment,
            product_name: product_name.to_string(),
        })
    }
}

/// Summary shown after a launch.
#[derive(Clone, Debug, PartialEq)]
pub struct CampaignResult {
    pub campaign_id: String,
    pub campaign_name: String,
    pub segment: Segment,
    pub product_name: String,
    pub status: &'static str,
    pub workflow: TriggerResponse,
}

/// Validates `request`, logs the campaign and triggers its workflow.
///
/// # Errors
/// Returns the validation error, or the backend error of whichever step failed.
#[instrument(skip_all, fields(campaign = %request.campaign_name))]
pub async fn launch(
    api: &AnalyticsClient,
    request: &CampaignRequest,
) -> Result<CampaignResult, CampaignError> {
    let campaign = request.validate()?;

    let started = api
        .start_campaign(&CampaignStartRequest {
            campaign_name: campaign.campaign_name.clone(),
            segment_name: campaign.segment.label().to_string(),
            product_name: campaign.product_name.clone(),
            total_customers: None,
        })
        .await
        .map_err(CampaignError::Start)?;
    info!(campaign_id = %started.campaign_id, "campaign logged");

    let payload = TriggerPayload::new(
        &started.campaign_id,
        &campaign.campaign_name,
        campaign.segment,
        &campaign.product_name,
    );
    let workflow = api
        .trigger_campaign(&payload)
        .await
        .map_err(|source| CampaignError::Trigger {
            campaign_id: started.campaign_id.clone(),
            source,
        })?;
    info!(campaign_id = %started.campaign_id, "campaign workflow triggered");

    Ok(CampaignResult {
        campaign_id: started.campaign_id,
        campaign_name: campaign.campaign_name,
        segment: campaign.segment,
        product_name: campaign.product_name,
        status: "running",
        workflow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn filled() -> CampaignRequest {
        CampaignRequest {
            campaign_name: " Spring Offer ".to_string(),
            segment: Some(Segment::AffluentCustomers),
            product_name: Some("Platinum Card".to_string()),
        }
    }

    #[test]
    fn validation_reports_first_missing_field() {
        let messages: Vec<String> = [
            CampaignRequest {
                segment: None,
                ..filled()
            },
            CampaignRequest {
                product_name: Some("  ".to_string()),
                ..filled()
            },
            CampaignRequest {
                campaign_name: String::new(),
                ..filled()
            },
        ]
        .iter()
        .filter_map(|request| request.validate().err())
        .map(|err| err.to_string())
        .collect();

        assert_eq!(
            messages,
            [
                "Please select a customer segment",
                "Please select a bank product",
                "Please enter a campaign name"
            ]
        );
        assert_eq!(
            filled().validate().ok().map(|valid| valid.campaign_name),
            Some("Spring Offer".to_string())
        );
    }

    #[tokio::test]
    async fn invalid_form_makes_no_request() -> anyhow::Result<()> {
        let api = AnalyticsClient::new("http://127.0.0.1:9")?;
        let result = launch(&api, &CampaignRequest::default()).await;
        assert!(matches!(result, Err(CampaignError::Invalid(_))));
        Ok(())
    }

    #[tokio::test]
    async fn launch_logs_then_triggers() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/campaigns/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "campaign_id": "spring_offer_affluent_customers_1",
                "message": "Campaign started successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/trigger-n8n-campaign"))
            .and(body_json(json!({
                "campaign_id": "spring_offer_affluent_customers_1",
                "campaign_name": "Spring Offer",
                "segment": "Affluent Customers",
                "segment_table": "affluent_customers",
                "product_name": "Platinum Card"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Campaign triggered successfully",
                "n8n_response": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = launch(&AnalyticsClient::new(&server.uri())?, &filled()).await?;
        assert_eq!(result.campaign_id, "spring_offer_affluent_customers_1");
        assert_eq!(result.status, "running");
        assert!(result.workflow.success);
        Ok(())
    }

    #[tokio::test]
    async fn failed_trigger_keeps_campaign_id() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/campaigns/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "campaign_id": "c-1"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/trigger-n8n-campaign"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "detail": "Failed to trigger n8n campaign: connection refused"
            })))
            .mount(&server)
            .await;

        let err = launch(&AnalyticsClient::new(&server.uri())?, &filled())
            .await
            .err();
        let Some(CampaignError::Trigger { campaign_id, source }) = err else {
            anyhow::bail!("expected a trigger failure");
        };
        assert_eq!(campaign_id, "c-1");
        assert_eq!(source.status(), Some(500));
        Ok(())
    }
}
