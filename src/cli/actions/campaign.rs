use crate::api::AnalyticsClient;
use crate::campaign::{launch, CampaignRequest};
use crate::cli::actions::{mount, require};
use crate::cli::globals::GlobalArgs;
use crate::routes::Route;
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub request: CampaignRequest,
}

/// Execute the campaign launch.
/// # Errors
/// Returns an error if the page is not accessible, the form is incomplete,
/// or either backend step fails.
pub async fn execute(args: Args) -> Result<()> {
    let context = mount(&args.globals).await?;
    require(&context, Route::MessageGeneration).await?;

    let api = AnalyticsClient::new(&args.globals.api_url)?;
    let result = launch(&api, &args.request).await?;

    println!("Campaign \"{}\" launched", result.campaign_name);
    println!("  id:       {}", result.campaign_id);
    println!("  segment:  {}", result.segment);
    println!("  product:  {}", result.product_name);
    println!("  status:   {}", result.status);
    Ok(())
}
