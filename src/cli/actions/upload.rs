use crate::api::AnalyticsClient;
use crate::cli::actions::{mount, require};
use crate::cli::globals::GlobalArgs;
use crate::routes::Route;
use crate::upload::{UploadFile, UploadSession, UploadValidationReport};
use anyhow::Result;
use std::path::PathBuf;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub file: PathBuf,
    /// Validate only when false.
    pub save: bool,
}

/// Execute the upload action.
/// # Errors
/// Returns an error if the page is not accessible, the file is not a CSV,
/// extraction fails, or the backend rejects the upload.
pub async fn execute(args: Args) -> Result<()> {
    let context = mount(&args.globals).await?;
    require(&context, Route::UploadData).await?;

    let file = UploadFile::from_path(&args.file).await?;
    let mut session: UploadSession = UploadSession::default();
    let report = session.choose(file).await?;
    print_report(report);

    if !args.save {
        return Ok(());
    }

    let api = AnalyticsClient::new(&args.globals.api_url)?;
    let saved = session.save(&api).await?;
    println!("{}", saved.message);
    for (table, result) in &saved.clusters {
        match &result.error {
            Some(error) => println!("  {table}: {} ({error})", result.status),
            None => println!("  {table}: {} rows", result.processed_count),
        }
    }
    Ok(())
}

fn print_report(report: &UploadValidationReport) {
    println!(
        "{} rows processed, {} valid, {} with errors ({}% success)",
        report.rows_processed(),
        report.valid_rows().len(),
        report.error_rows(),
        report.success_rate()
    );
    for message in report.visible_errors() {
        println!("  - {message}");
    }
    for row in report.preview() {
        println!("  {}", serde_json::Value::Object(row.clone()));
    }
    println!("{}", report.status_line());
}
