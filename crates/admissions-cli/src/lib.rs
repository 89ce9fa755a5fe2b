//! Shared pieces of the submission binaries.

use admissions_api_client::{
    ApiClient, DirectUploadExecutor, FailureKind, SubmissionOutcome, SubmissionWorkflow,
    UploadState, WorkflowError,
};
use admissions_core::models::FileSlot;
use anyhow::Context;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
/// An operator has to reconcile storage by hand
pub const EXIT_OPERATOR_ACTION: u8 = 2;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// API client and workflow from `ADMISSIONS_API_URL` / `ADMISSIONS_API_TOKEN`, printing
/// progress to stderr.
pub fn workflow_from_env() -> anyhow::Result<(ApiClient, SubmissionWorkflow)> {
    let client = ApiClient::from_env()
        .context("Failed to create API client. Set ADMISSIONS_API_TOKEN and ADMISSIONS_API_URL")?;
    let executor = DirectUploadExecutor::new()?;
    let workflow = SubmissionWorkflow::from_client(client.clone(), executor)
        .on_progress(|slot, state| eprintln!("{}", progress_line(slot, state)));
    Ok((client, workflow))
}

pub fn progress_line(slot: FileSlot, state: &UploadState) -> String {
    let step = match state {
        UploadState::ComputingChecksum => "computing checksum",
        UploadState::RequestingAuthorization => "requesting upload authorization",
        UploadState::Uploading => "uploading",
        UploadState::CommittingReference => "saving to application",
        UploadState::ResettingStatus => "sending report back for review",
        UploadState::Done => "done",
        UploadState::Failed(FailureKind::OrphanedUpload) => "failed, needs operator action",
        UploadState::Failed(_) => "failed",
    };
    format!("[{}] {}", slot, step)
}

/// Print the outcome and pick the process exit code.
pub fn finish(result: Result<SubmissionOutcome, WorkflowError>) -> u8 {
    match result {
        Ok(outcome) => {
            for warning in &outcome.warnings {
                tracing::warn!(warning = %warning, "Submission completed with a warning");
            }
            let committed = serde_json::json!({
                "committed": outcome
                    .committed
                    .iter()
                    .map(|r| serde_json::json!({ "slot": r.slot, "committed_at": r.committed_at }))
                    .collect::<Vec<_>>(),
                "warnings": outcome.warnings.len(),
            });
            println!("{}", committed);
            EXIT_SUCCESS
        }
        Err(err) => {
            println!("{}", err.user_message());
            if err.is_operator_actionable() {
                tracing::error!(error = %err, "Operator action required");
                EXIT_OPERATOR_ACTION
            } else {
                tracing::debug!(error = %err, "Submission failed");
                EXIT_FAILURE
            }
        }
    }
}
