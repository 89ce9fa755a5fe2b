use admissions_api_client::{FileUpload, SubmissionTarget};
use admissions_cli::{finish, init_tracing, workflow_from_env, EXIT_FAILURE};
use admissions_core::models::FileSlot;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "submit_report")]
#[command(about = "Upload or replace the report for your application")]
struct Args {
    /// Report (PDF, PNG, JPEG or WebP). Replacing a report sends it back for review.
    #[arg(long, value_name = "PATH")]
    report: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let (client, workflow) = workflow_from_env()?;

    let report = match FileUpload::from_path(FileSlot::Report, args.report) {
        Ok(report) => report,
        Err(err) => return Ok(ExitCode::from(finish(Err(err)))),
    };

    let application = match client.my_application().await {
        Ok(application) => application,
        Err(err) => {
            tracing::error!(error = %err, "Could not load application");
            println!("No application was found for your account.");
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };

    let result = workflow
        .submit(SubmissionTarget::from(&application), vec![report])
        .await;
    Ok(ExitCode::from(finish(result)))
}
