use crate::cli::actions::{account, campaign, open, report, upload, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Account(args) => account::execute(args).await,
        Action::Open(args) => open::execute(args).await,
        Action::Upload(args) => upload::execute(args).await,
        Action::Report(args) => report::execute(args).await,
        Action::Campaign(args) => campaign::execute(args).await,
    }
}
