use admissions_api_client::{FileUpload, SubmissionTarget, WorkflowError};
use admissions_cli::{finish, init_tracing, workflow_from_env, EXIT_FAILURE};
use admissions_core::models::FileSlot;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "submit_documents")]
#[command(about = "Upload the school certificate and grades for your application")]
struct Args {
    /// School certificate (PDF, PNG, JPEG or WebP)
    #[arg(long, value_name = "PATH")]
    certificate: PathBuf,

    /// Grades (PDF, PNG, JPEG or WebP)
    #[arg(long, value_name = "PATH")]
    grades: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let (client, workflow) = workflow_from_env()?;

    let files = match [
        FileUpload::from_path(FileSlot::SchoolCertificate, args.certificate),
        FileUpload::from_path(FileSlot::Grades, args.grades),
    ]
    .into_iter()
    .collect::<Result<Vec<_>, WorkflowError>>()
    {
        Ok(files) => files,
        Err(err) => return Ok(ExitCode::from(finish(Err(err)))),
    };

    if let Err(err) = workflow.ensure_open().await {
        return Ok(ExitCode::from(finish(Err(err))));
    }

    let application = match client.create_application().await {
        Ok(application) => application,
        Err(err) => {
            tracing::error!(error = %err, "Could not open application");
            println!("Your application could not be opened. Please try again later.");
            return Ok(ExitCode::from(EXIT_FAILURE));
        }
    };

    let result = workflow
        .submit(SubmissionTarget::from(&application), files)
        .await;
    Ok(ExitCode::from(finish(result)))
}
