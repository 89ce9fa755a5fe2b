//! Document workflow integration tests: commit, review status, read back, reconciliation.
//!
//! Run with: `cargo test -p admissions-api --test workflow_test`

mod helpers;

use admissions_core::models::{
    ApplicationResponse, ApplicationStatus, FileSlot, ReadAuthorization, ReconciliationReport,
    ReportStatus, UploadAuthorization,
};
use admissions_core::{StatusAction, StatusContent, Tone};
use admissions_storage::parse_signed_query;
use axum::http::StatusCode;
use helpers::uploads::{
    create_application, local_path, put_signed, request_authorization, upload_and_commit,
    PDF_BYTES,
};
use helpers::{api_path, setup_test_app};
use serde_json::json;

#[tokio::test]
async fn test_commit_certificate_and_grades() {
    let app = setup_test_app(true).await;
    let applicant = app.applicant();
    let application = create_application(app.client(), &applicant).await;

    let certificate = upload_and_commit(
        app.client(),
        &applicant,
        &application,
        FileSlot::SchoolCertificate,
        PDF_BYTES,
    )
    .await;
    let grades = upload_and_commit(
        app.client(),
        &applicant,
        &application,
        FileSlot::Grades,
        b"%PDF-1.4 grades",
    )
    .await;

    let response = app
        .client()
        .get(&api_path("/applications/me"))
        .add_header("Authorization", applicant.bearer())
        .await;
    response.assert_status_ok();
    let current = response.json::<ApplicationResponse>();

    assert_eq!(current.files.len(), 2);
    assert_eq!(current.file(FileSlot::SchoolCertificate), Some(&certificate));
    assert_eq!(current.file(FileSlot::Grades), Some(&grades));
    assert!(current.file(FileSlot::Report).is_none());
}

#[tokio::test]
async fn test_recommit_keeps_one_reference_per_slot() {
    let app = setup_test_app(true).await;
    let applicant = app.applicant();
    let application = create_application(app.client(), &applicant).await;

    let first =
        upload_and_commit(app.client(), &applicant, &application, FileSlot::Grades, PDF_BYTES)
            .await;
    let second = upload_and_commit(
        app.client(),
        &applicant,
        &application,
        FileSlot::Grades,
        b"%PDF-1.4 corrected grades",
    )
    .await;

    assert_eq!(first.object_key, second.object_key);
    assert!(second.committed_at >= first.committed_at);

    let current = create_application(app.client(), &applicant).await;
    assert_eq!(current.files.len(), 1);
    assert_eq!(current.file(FileSlot::Grades), Some(&second));
}

#[tokio::test]
async fn test_report_review_cycle() {
    let app = setup_test_app(true).await;
    let applicant = app.applicant();
    let reviewer = app.reviewer();
    let application = create_application(app.client(), &applicant).await;
    let status_path = api_path(&format!("/applications/{}/status", application.id));

    app.client()
        .patch(&status_path)
        .add_header("Authorization", reviewer.bearer())
        .json(&json!({ "field": "status", "value": "NOTIFIED" }))
        .await
        .assert_status_ok();

    upload_and_commit(app.client(), &applicant, &application, FileSlot::Report, PDF_BYTES).await;

    let response = app
        .client()
        .patch(&status_path)
        .add_header("Authorization", reviewer.bearer())
        .json(&json!({ "field": "report_status", "value": "VALID" }))
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<ApplicationResponse>().report_status,
        Some(ReportStatus::Valid)
    );

    // Applicants cannot approve their own report
    let response = app
        .client()
        .patch(&status_path)
        .add_header("Authorization", applicant.bearer())
        .json(&json!({ "field": "report_status", "value": "VALID" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    // Replacing the report sends it back for review
    upload_and_commit(
        app.client(),
        &applicant,
        &application,
        FileSlot::Report,
        b"%PDF-1.4 revised report",
    )
    .await;
    let response = app
        .client()
        .patch(&status_path)
        .add_header("Authorization", applicant.bearer())
        .json(&json!({ "field": "report_status", "value": "PENDING" }))
        .await;
    response.assert_status_ok();
    let current = response.json::<ApplicationResponse>();
    assert_eq!(current.status, ApplicationStatus::Notified);
    assert_eq!(current.report_status, Some(ReportStatus::Pending));
}

#[tokio::test]
async fn test_failed_report_transfer_keeps_review_status() {
    let app = setup_test_app(true).await;
    let applicant = app.applicant();
    let reviewer = app.reviewer();
    let application = create_application(app.client(), &applicant).await;
    let application_path = api_path(&format!("/applications/{}", application.id));

    let original =
        upload_and_commit(app.client(), &applicant, &application, FileSlot::Report, PDF_BYTES)
            .await;
    app.client()
        .patch(&format!("{}/status", application_path))
        .add_header("Authorization", reviewer.bearer())
        .json(&json!({ "field": "report_status", "value": "VALID" }))
        .await
        .assert_status_ok();

    let revised: &[u8] = b"%PDF-1.4 revised report";
    let response = request_authorization(
        app.client(),
        &applicant,
        FileSlot::Report,
        "application/pdf",
        revised,
    )
    .await;
    response.assert_status_ok();
    let authorization = response.json::<UploadAuthorization>();

    // Same length, different bytes
    let tampered: &[u8] = b"%PDF-1.4 altered report";
    assert_eq!(tampered.len(), revised.len());
    let response = put_signed(app.client(), &authorization, tampered).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = app
        .client()
        .get(&application_path)
        .add_header("Authorization", reviewer.bearer())
        .await;
    response.assert_status_ok();
    let current = response.json::<ApplicationResponse>();
    assert_eq!(current.report_status, Some(ReportStatus::Valid));
    let report = current.file(FileSlot::Report).expect("report still committed");
    assert_eq!(report.committed_at, original.committed_at);
}

#[tokio::test]
async fn test_applicant_cannot_change_application_status() {
    let app = setup_test_app(true).await;
    let applicant = app.applicant();
    let application = create_application(app.client(), &applicant).await;

    let response = app
        .client()
        .patch(&api_path(&format!("/applications/{}/status", application.id)))
        .add_header("Authorization", applicant.bearer())
        .json(&json!({ "field": "status", "value": "PENDING" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_read_url_serves_committed_bytes() {
    let app = setup_test_app(true).await;
    let applicant = app.applicant();
    let reviewer = app.reviewer();
    let application = create_application(app.client(), &applicant).await;

    let response = app
        .client()
        .get(&api_path(&format!(
            "/applications/{}/files/report/read-url",
            application.id
        )))
        .add_header("Authorization", reviewer.bearer())
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    upload_and_commit(app.client(), &applicant, &application, FileSlot::Report, PDF_BYTES).await;

    let response = app
        .client()
        .get(&api_path(&format!(
            "/applications/{}/files/report/read-url",
            application.id
        )))
        .add_header("Authorization", reviewer.bearer())
        .await;
    response.assert_status_ok();
    let read = response.json::<ReadAuthorization>();

    let (path, query) = local_path(&read.target_url);
    let signed = parse_signed_query(&query).unwrap();
    let response = app
        .client()
        .get(&path)
        .add_query_param("expires", signed.expires)
        .add_query_param("sig", &signed.signature)
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), PDF_BYTES);

    // The signature covers the key
    let response = app
        .client()
        .get(&path.replace("report", "grades"))
        .add_query_param("expires", signed.expires)
        .add_query_param("sig", &signed.signature)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reconciliation_reports_uncommitted_upload() {
    let app = setup_test_app(true).await;
    let applicant = app.applicant();
    let reviewer = app.reviewer();
    let application = create_application(app.client(), &applicant).await;

    upload_and_commit(app.client(), &applicant, &application, FileSlot::Grades, PDF_BYTES).await;

    // Transfer succeeds but the commit never happens
    let authorization = request_authorization(
        app.client(),
        &applicant,
        FileSlot::SchoolCertificate,
        "application/pdf",
        PDF_BYTES,
    )
    .await
    .json::<UploadAuthorization>();
    put_signed(app.client(), &authorization, PDF_BYTES)
        .await
        .assert_status_ok();

    let path = api_path(&format!("/applications/{}/reconciliation", application.id));

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", applicant.bearer())
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .client()
        .get(&path)
        .add_header("Authorization", reviewer.bearer())
        .await;
    response.assert_status_ok();
    let report = response.json::<ReconciliationReport>();

    assert_eq!(report.application_id, application.id);
    assert_eq!(report.orphaned.len(), 1);
    assert_eq!(report.orphaned[0].slot, FileSlot::SchoolCertificate);
    assert_eq!(report.orphaned[0].object_key, authorization.object_key);
    assert_eq!(report.orphaned[0].owner_id, applicant.user_id);
    assert!(report.dangling.is_empty());
}

#[tokio::test]
async fn test_portal_status_follows_application() {
    let app = setup_test_app(false).await;
    let applicant = app.applicant();

    let status = |content: StatusContent| (content.tone, content.action);

    let response = app
        .client()
        .get(&api_path("/portal/status"))
        .add_header("Authorization", applicant.bearer())
        .await;
    response.assert_status_ok();
    assert_eq!(status(response.json()), (Tone::Info, None));

    app.set_applications_open(true).await;
    let response = app
        .client()
        .get(&api_path("/portal/status"))
        .add_header("Authorization", applicant.bearer())
        .await;
    assert_eq!(
        status(response.json()),
        (Tone::Info, Some(StatusAction::StartApplication))
    );

    create_application(app.client(), &applicant).await;
    let response = app
        .client()
        .get(&api_path("/portal/status"))
        .add_header("Authorization", applicant.bearer())
        .await;
    assert_eq!(
        status(response.json()),
        (Tone::Warning, Some(StatusAction::ContinueApplication))
    );

    app.set_applications_open(false).await;
    let response = app
        .client()
        .get(&api_path("/portal/status"))
        .add_header("Authorization", applicant.bearer())
        .await;
    assert_eq!(status(response.json()), (Tone::Error, None));

    let reviewer = app.reviewer();
    let response = app
        .client()
        .get(&api_path("/portal/status"))
        .add_header("Authorization", reviewer.bearer())
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
