//! Dashboard subcommands. All of them sit behind the route guard.

use crate::api::Segment;
use clap::{builder::ValueParser, Arg, Command};
use std::path::PathBuf;

pub const ARG_FILE: &str = "file";
pub const ARG_PATH: &str = "path";
pub const ARG_SEGMENT: &str = "segment";
pub const ARG_PRODUCT: &str = "product";
pub const ARG_NAME: &str = "name";
pub const ARG_LIMIT: &str = "limit";
pub const ARG_ID: &str = "id";
pub const ARG_RECHECK: &str = "recheck";

#[must_use]
pub fn validator_segment() -> ValueParser {
    ValueParser::from(|value: &str| -> std::result::Result<Segment, String> { value.parse() })
}

fn file() -> Arg {
    Arg::new(ARG_FILE)
        .help("CSV file with customer rows")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
}

fn segment(required: bool) -> Arg {
    Arg::new(ARG_SEGMENT)
        .short('s')
        .long("segment")
        .help("Customer segment, by label or table name (e.g. \"Affluent Customers\", affluent_customers)")
        .required(required)
        .value_parser(validator_segment())
}

#[must_use]
pub fn subcommands() -> Vec<Command> {
    vec![
        Command::new("open")
            .about("Navigate to a page and show what would be rendered")
            .arg(
                Arg::new(ARG_PATH)
                    .help("Page path, e.g. /pages/dashboard")
                    .default_value("/"),
            )
            .arg(
                Arg::new(ARG_RECHECK)
                    .long("recheck")
                    .help("Reload the session first if the email was just verified")
                    .action(clap::ArgAction::SetTrue),
            ),
        Command::new("validate")
            .about("Validate a customer CSV without saving it")
            .arg(file()),
        Command::new("upload")
            .about("Validate a customer CSV, then segment and store it")
            .arg(file()),
        Command::new("dashboard").about("Show customer and campaign totals"),
        Command::new("history").about("List uploads, segmentation runs and campaigns"),
        Command::new("campaigns")
            .about("List recent campaigns, or show one")
            .arg(
                Arg::new(ARG_ID)
                    .long("id")
                    .help("Campaign id to show"),
            )
            .arg(
                Arg::new(ARG_LIMIT)
                    .short('l')
                    .long("limit")
                    .help("How many recent campaigns to list")
                    .default_value("10")
                    .value_parser(clap::value_parser!(u32).range(1..=100)),
            ),
        Command::new("products")
            .about("List bank products offered to a segment")
            .arg(segment(true)),
        Command::new("campaign")
            .about("Launch a campaign for a segment and product")
            .arg(segment(false))
            .arg(
                Arg::new(ARG_PRODUCT)
                    .long("product")
                    .help("Bank product name"),
            )
            .arg(
                Arg::new(ARG_NAME)
                    .short('n')
                    .long("name")
                    .help("Campaign name")
                    .default_value(""),
            ),
    ]
}
