use crate::upload::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Customer cohort produced by segmentation. Each one is stored in its own
/// table and has its own product range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    #[serde(rename = "New & Cautious")]
    NewAndCautious,
    #[serde(rename = "Stable Earners")]
    StableEarners,
    #[serde(rename = "Mid-Tier Professionals")]
    MidTierProfessionals,
    #[serde(rename = "Affluent Customers")]
    AffluentCustomers,
    #[serde(rename = "High-Value Elite")]
    HighValueElite,
}

impl Segment {
    /// Ordered from lowest to highest income.
    pub const ALL: [Self; 5] = [
        Self::NewAndCautious,
        Self::StableEarners,
        Self::MidTierProfessionals,
        Self::AffluentCustomers,
        Self::HighValueElite,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NewAndCautious => "New & Cautious",
            Self::StableEarners => "Stable Earners",
            Self::MidTierProfessionals => "Mid-Tier Professionals",
            Self::AffluentCustomers => "Affluent Customers",
            Self::HighValueElite => "High-Value Elite",
        }
    }

    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::NewAndCautious => "new_and_cautious",
            Self::StableEarners => "stable_earners",
            Self::MidTierProfessionals => "mid_tier_professionals",
            Self::AffluentCustomers => "affluent_customers",
            Self::HighValueElite => "high_value_elite",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Segment {
    type Err = String;

    /// Accepts the label or the table name, ignoring case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|segment| {
                segment.label().eq_ignore_ascii_case(value)
                    || segment.table().eq_ignore_ascii_case(value)
            })
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|segment| segment.label()).collect();
                format!("unknown segment '{value}', expected one of: {}", known.join(", "))
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub success: bool,
    pub total_customers: u64,
    pub total_messages_sent: u64,
    #[serde(default)]
    pub customer_counts: BTreeMap<String, u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCounts {
    #[serde(default)]
    pub success: bool,
    pub customer_counts: BTreeMap<String, u64>,
    pub total_customers: u64,
}

impl CustomerCounts {
    #[must_use]
    pub fn count_for(&self, segment: Segment) -> u64 {
        self.customer_counts
            .get(segment.label())
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStartRequest {
    pub campaign_name: String,
    pub segment_name: String,
    pub product_name: String,
    /// Counted by the backend when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_customers: Option<u64>,
}

/// A row of the campaign log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignLog {
    pub campaign_id: String,
    pub campaign_name: String,
    pub segment_name: String,
    pub product_name: String,
    pub status: String,
    #[serde(default)]
    pub total_customers: Option<u64>,
    #[serde(default)]
    pub emails_sent: Option<u64>,
    /// Naive ISO timestamp as written by the backend.
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(flatten)]
    pub extra: Record,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CampaignStartResponse {
    #[serde(default)]
    pub success: bool,
    pub campaign_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<CampaignLog>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecentCampaigns {
    #[serde(default)]
    pub success: bool,
    pub campaigns: Vec<CampaignLog>,
    pub total: u64,
}

#[derive(Deserialize)]
pub(crate) struct CampaignEnvelope {
    pub(crate) campaign: CampaignLog,
}

/// Body forwarded to the campaign workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPayload {
    pub campaign_id: String,
    pub campaign_name: String,
    pub segment: String,
    pub segment_table: String,
    pub product_name: String,
}

impl TriggerPayload {
    #[must_use]
    pub fn new(campaign_id: &str, campaign_name: &str, segment: Segment, product_name: &str) -> Self {
        Self {
            campaign_id: campaign_id.to_string(),
            campaign_name: campaign_name.to_string(),
            segment: segment.label().to_string(),
            segment_table: segment.table().to_string(),
            product_name: product_name.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub n8n_response: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub processed_count: u64,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == "success"
    }
}

/// Per-table outcome of segmenting and storing an upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentAndStoreResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterResult>,
}

impl SegmentAndStoreResponse {
    #[must_use]
    pub fn stored_rows(&self) -> u64 {
        self.clusters
            .values()
            .filter(|cluster| cluster.succeeded())
            .map(|cluster| cluster.processed_count)
            .sum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
}

impl Health {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Row of the `bank_products` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BankProduct {
    pub product_name: String,
    pub cluster_name: String,
    #[serde(flatten)]
    pub extra: Record,
}
