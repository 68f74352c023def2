use crate::api::{
    describe_record, AnalyticsClient, CampaignLog, Health, ProductCatalog, Segment,
};
use crate::cli::actions::{load, mount, require};
use crate::cli::globals::GlobalArgs;
use crate::routes::Route;
use anyhow::{Context, Result};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum Command {
    Dashboard,
    History,
    Campaigns { id: Option<String>, limit: u32 },
    Products { segment: Segment },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

impl Command {
    /// The page these figures appear on.
    #[must_use]
    pub const fn route(&self) -> Route {
        match self {
            Self::Dashboard => Route::Dashboard,
            Self::History | Self::Campaigns { .. } => Route::History,
            Self::Products { .. } => Route::MessageGeneration,
        }
    }
}

/// Execute a read-only report.
/// # Errors
/// Returns an error if the page is not accessible or the backend call fails.
pub async fn execute(args: Args) -> Result<()> {
    let context = mount(&args.globals).await?;
    require(&context, args.command.route()).await?;
    let api = AnalyticsClient::new(&args.globals.api_url)?;

    match args.command {
        Command::Dashboard => {
            let health = api
                .health()
                .await
                .with_context(|| format!("Analytics backend unreachable at {}", api.base_url()))?;
            if let Some(notice) = health_notice(&health) {
                warn!(status = %health.status, "analytics backend degraded");
                eprintln!("{notice}");
            }

            let Some(loaded) =
                load("dashboard", async { tokio::try_join!(api.overview(), api.dashboard_stats()) })
                    .await
            else {
                debug!("dashboard closed before its data arrived");
                return Ok(());
            };
            let (overview, stats) = loaded?;

            println!("Total customers:   {}", overview.total_customers);
            println!("Uploaded files:    {}", overview.uploaded_files);
            println!("Last segmentation: {}", overview.last_segmentation_label());
            println!("Messages sent:     {}", overview.messages_sent);
            for segment in Segment::ALL {
                let count = stats
                    .customer_counts
                    .get(segment.label())
                    .copied()
                    .unwrap_or(0);
                println!("  {:<24} {count}", segment.label());
            }
            if overview.activity.is_empty() {
                println!("No recent activity");
            } else {
                println!("Recent activity:");
                for entry in &overview.activity {
                    println!("  {}", describe_record(entry));
                }
            }
        }
        Command::History => {
            let Some(loaded) = load("history", api.history()).await else {
                debug!("history closed before its data arrived");
                return Ok(());
            };
            let history = loaded?;
            for (title, rows) in [
                ("Uploads", &history.uploads),
                ("Segmentations", &history.segmentations),
                ("Campaigns", &history.campaigns),
            ] {
                println!("{title} ({})", rows.len());
                for row in rows {
                    println!("  {}", describe_record(row));
                }
            }
        }
        Command::Campaigns { id: Some(id), .. } => {
            print_campaign(&api.campaign(&id).await?);
        }
        Command::Campaigns { id: None, limit } => {
            let recent = api.recent_campaigns(limit).await?;
            println!("{} campaigns", recent.total);
            for campaign in &recent.campaigns {
                print_campaign(campaign);
            }
        }
        Command::Products { segment } => {
            let catalog = ProductCatalog::new(&args.globals.auth_url, args.globals.anon_key)?;
            let (products, counts) =
                tokio::try_join!(catalog.products_for(segment), api.customer_counts())?;
            println!(
                "{}: {} customers",
                segment.label(),
                counts.count_for(segment)
            );
            for product in products {
                println!("  {}", product.product_name);
            }
        }
    }
    Ok(())
}

/// Warning shown above the dashboard when the backend reports a problem.
fn health_notice(health: &Health) -> Option<String> {
    if health.is_healthy() {
        return None;
    }
    Some(if health.message.is_empty() {
        format!("Analytics backend is {}", health.status)
    } else {
        format!("Analytics backend is {}: {}", health.status, health.message)
    })
}

fn print_campaign(campaign: &CampaignLog) {
    println!(
        "{}  {}  {} / {}  [{}]",
        campaign.campaign_id,
        campaign.campaign_name,
        campaign.segment_name,
        campaign.product_name,
        campaign.status
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_are_gated_by_their_page() {
        assert_eq!(Command::Dashboard.route(), Route::Dashboard);
        assert_eq!(Command::History.route(), Route::History);
        assert_eq!(
            Command::Products {
                segment: Segment::StableEarners
            }
            .route(),
            Route::MessageGeneration
        );
        assert!(Command::Campaigns { id: None, limit: 5 }.route().is_protected());
    }

    #[test]
    fn degraded_backend_gets_a_notice() {
        let healthy = Health {
            status: "healthy".to_string(),
            ..Health::default()
        };
        assert_eq!(health_notice(&healthy), None);

        let degraded = Health {
            status: "degraded".to_string(),
            message: "model not loaded".to_string(),
            ..Health::default()
        };
        assert_eq!(
            health_notice(&degraded).as_deref(),
            Some("Analytics backend is degraded: model not loaded")
        );
    }
}
