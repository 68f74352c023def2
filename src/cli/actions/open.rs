use crate::cli::globals::GlobalArgs;
use crate::guard::{GuardState, RouteGuard, VerificationPrompt};
use crate::routes::{Location, Navigation, Navigator, Route};
use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub location: Location,
    pub recheck: bool,
}

/// Renders a navigation outcome as terminal text.
#[must_use]
pub fn describe(navigation: &Navigation<&'static str>) -> String {
    match navigation {
        Navigation::Render(route, title) => format!("{title} ({route})"),
        Navigation::Waiting(route) => format!("Loading {route}..."),
        Navigation::Redirect(redirect) => {
            let from = redirect
                .from
                .as_ref()
                .map_or_else(String::new, |from| format!(", then back to {from}"));
            format!("Please sign in first: {}{from}", redirect.to)
        }
        Navigation::VerifyEmail(prompt) => format!(
            "{}\n{}\nSigned in as {}. Once confirmed, run `crmdash open --recheck` (\"{}\").",
            VerificationPrompt::TITLE,
            VerificationPrompt::BODY,
            prompt.email,
            VerificationPrompt::ACTION
        ),
        Navigation::NotFound(location) => format!("Page not found: {location}"),
    }
}

/// Execute the open action.
/// # Errors
/// Returns an error if the auth stack cannot be built.
pub async fn execute(args: Args) -> Result<()> {
    let context = super::mount(&args.globals).await?;

    if args.recheck {
        let state = RouteGuard::new(&context).recheck().await;
        info!(?state, "session reloaded");
        if state == GuardState::AuthenticatedUnverified {
            println!("Email still not verified.");
        }
    }

    let navigation = Navigator::new(&context)
        .navigate_resolved(&args.location, Route::title)
        .await;
    println!("{}", describe(&navigation));
    Ok(())
}
