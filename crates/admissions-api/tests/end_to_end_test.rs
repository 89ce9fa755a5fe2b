//! Runs the real submission client against a live server on an ephemeral port.
//!
//! Run with: `cargo test -p admissions-api --test end_to_end_test`

mod helpers;

use admissions_api_client::{
    ApiClient, ClientConfig, DirectUploadExecutor, FileUpload, SubmissionTarget,
    SubmissionWorkflow, WorkflowError,
};
use admissions_core::models::{ApplicationStatus, FileSlot, ReportStatus, ReviewStatusUpdate};
use admissions_core::object_key;
use helpers::auth::TestUser;
use helpers::build_test_router;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

struct LiveServer {
    base_url: String,
    state: Arc<admissions_api::state::AppState>,
    _storage_dir: TempDir,
}

async fn start_server() -> LiveServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind ephemeral port");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let (router, state, storage_dir) = build_test_router(&base_url).await;
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server error");
    });

    LiveServer {
        base_url,
        state,
        _storage_dir: storage_dir,
    }
}

fn client_for(server: &LiveServer, user: &TestUser) -> ApiClient {
    ApiClient::new(ClientConfig {
        base_url: server.base_url.clone(),
        token: user.token.clone(),
    })
    .unwrap()
}

fn workflow_for(client: &ApiClient) -> SubmissionWorkflow {
    SubmissionWorkflow::from_client(client.clone(), DirectUploadExecutor::new().unwrap())
}

#[tokio::test]
async fn test_documents_and_report_end_to_end() {
    let server = start_server().await;
    let applicant = TestUser::applicant(Uuid::new_v4());
    let reviewer = TestUser::reviewer();
    let applicant_client = client_for(&server, &applicant);
    let reviewer_client = client_for(&server, &reviewer);

    reviewer_client.set_applications_open(true).await.unwrap();

    let application = applicant_client.create_application().await.unwrap();
    let workflow = workflow_for(&applicant_client);

    let outcome = workflow
        .submit(
            SubmissionTarget::from(&application),
            vec![
                FileUpload::from_bytes(
                    FileSlot::SchoolCertificate,
                    "application/pdf",
                    b"%PDF-1.4 certificate".to_vec(),
                ),
                FileUpload::from_bytes(FileSlot::Grades, "image/png", b"\x89PNG grades".to_vec()),
            ],
        )
        .await
        .unwrap();
    assert_eq!(outcome.committed.len(), 2);

    let current = applicant_client.my_application().await.unwrap();
    assert_eq!(current.files.len(), 2);
    assert_eq!(
        current.file(FileSlot::Grades).map(|f| f.object_key.clone()),
        Some(object_key(applicant.user_id, FileSlot::Grades))
    );

    // Reviewer approves a first report; replacing it sends it back to PENDING
    reviewer_client
        .update_status(application.id, ReviewStatusUpdate::Status(ApplicationStatus::Notified))
        .await
        .unwrap();
    workflow
        .submit(
            SubmissionTarget::from(&application),
            vec![FileUpload::from_bytes(
                FileSlot::Report,
                "application/pdf",
                b"%PDF-1.4 report v1".to_vec(),
            )],
        )
        .await
        .unwrap();
    reviewer_client
        .update_status(
            application.id,
            ReviewStatusUpdate::ReportStatus(ReportStatus::Valid),
        )
        .await
        .unwrap();

    let outcome = workflow
        .submit(
            SubmissionTarget::from(&application),
            vec![FileUpload::from_bytes(
                FileSlot::Report,
                "application/pdf",
                b"%PDF-1.4 report v2".to_vec(),
            )],
        )
        .await
        .unwrap();
    assert!(outcome.warnings.is_empty());

    let current = reviewer_client.get_application(application.id).await.unwrap();
    assert_eq!(current.status, ApplicationStatus::Notified);
    assert_eq!(current.report_status, Some(ReportStatus::Pending));
    assert_eq!(current.files.len(), 3);

    // The stored report is the replacement
    let read = reviewer_client
        .read_url(application.id, FileSlot::Report)
        .await
        .unwrap();
    let bytes = reqwest::get(&read.target_url)
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), b"%PDF-1.4 report v2");
}

#[tokio::test]
async fn test_closed_gate_rejects_submission_before_any_upload() {
    let server = start_server().await;
    let applicant = TestUser::applicant(Uuid::new_v4());
    let client = client_for(&server, &applicant);

    let target = SubmissionTarget {
        application_id: Uuid::new_v4(),
        owner_id: applicant.user_id,
    };
    let err = workflow_for(&client)
        .submit(
            target,
            vec![FileUpload::from_bytes(
                FileSlot::Grades,
                "application/pdf",
                b"%PDF grades".to_vec(),
            )],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::SubmissionsClosed));

    let key = object_key(applicant.user_id, FileSlot::Grades);
    assert!(!server.state.storage.exists(&key).await.unwrap());
}

#[tokio::test]
async fn test_commit_failure_surfaces_orphaned_upload() {
    let server = start_server().await;
    let applicant = TestUser::applicant(Uuid::new_v4());
    let client = client_for(&server, &applicant);
    server
        .state
        .stores
        .settings
        .set_applications_open(true)
        .await
        .unwrap();

    // No application record exists, so the commit is refused after the transfer
    let target = SubmissionTarget {
        application_id: Uuid::new_v4(),
        owner_id: applicant.user_id,
    };
    let err = workflow_for(&client)
        .submit(
            target,
            vec![FileUpload::from_bytes(
                FileSlot::Grades,
                "application/pdf",
                b"%PDF grades".to_vec(),
            )],
        )
        .await
        .unwrap_err();

    assert!(err.is_operator_actionable());
    match err {
        WorkflowError::OrphanedUpload {
            owner, object_key: key, ..
        } => {
            assert_eq!(owner, applicant.user_id);
            assert_eq!(key, object_key(applicant.user_id, FileSlot::Grades));
            assert!(server.state.storage.exists(&key).await.unwrap());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_side_type_rejection_maps_to_unsupported_type() {
    let server = start_server().await;
    let applicant = TestUser::applicant(Uuid::new_v4());
    let client = client_for(&server, &applicant);
    server
        .state
        .stores
        .settings
        .set_applications_open(true)
        .await
        .unwrap();

    // The local policy lets the type through; the server does not
    let err = workflow_for(&client)
        .with_policy(admissions_core::UploadPolicy::new(
            vec!["application/x-custom".to_string()],
            1024,
        ))
        .submit(
            SubmissionTarget {
                application_id: Uuid::new_v4(),
                owner_id: applicant.user_id,
            },
            vec![FileUpload::from_bytes(
                FileSlot::Grades,
                "application/x-custom",
                b"data".to_vec(),
            )],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UnsupportedType { .. }));
}
