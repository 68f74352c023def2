pub mod auth;
pub mod data;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const ARG_AUTH_URL: &str = "auth-url";
pub const ARG_ANON_KEY: &str = "anon-key";
pub const ARG_API_URL: &str = "api-url";
pub const ARG_SITE_URL: &str = "site-url";
pub const ARG_SESSION_FILE: &str = "session-file";

pub const DEFAULT_SITE_URL: &str = "http://localhost:5173";
pub const DEFAULT_SESSION_FILE: &str = ".crmdash/session.json";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_URL)
                .long("auth-url")
                .help("Auth service URL, example: https://<project>.supabase.co")
                .env("CRMDASH_AUTH_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_ANON_KEY)
                .long("anon-key")
                .help("Public (anon) key of the auth service")
                .env("CRMDASH_AUTH_ANON_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Segmentation and campaign backend URL")
                .env("CRMDASH_API_URL")
                .default_value(crate::api::DEFAULT_API_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SITE_URL)
                .long("site-url")
                .help("Public URL of the dashboard, used for email redirect links")
                .env("CRMDASH_SITE_URL")
                .default_value(DEFAULT_SITE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long("session-file")
                .help("Where the signed-in session is kept between runs")
                .env("CRMDASH_SESSION_FILE")
                .default_value(DEFAULT_SESSION_FILE)
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .global(true),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("crmdash")
        .about("Customer segmentation and campaign dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands(auth::subcommands())
        .subcommands(data::subcommands());

    let command = with_args(command);
    logging::with_args(command)
}
