//! Orphan detection.
//!
//! An upload and its commit are separate writes to separate systems. When the commit
//! fails the object stays in storage with nothing pointing at it. Keys are deterministic
//! per slot, so comparing each slot's key against the committed references finds them.

use crate::error::storage_error;
use admissions_core::models::{
    Application, FileSlot, OrphanedObject, ReconciliationReport, StoredObjectReference,
};
use admissions_core::{object_key, AppError};
use admissions_storage::Storage;

#[tracing::instrument(
    skip(storage, application, references),
    fields(application_id = %application.id, operation = "reconcile_application")
)]
pub async fn reconcile_application(
    storage: &dyn Storage,
    application: &Application,
    references: &[StoredObjectReference],
) -> Result<ReconciliationReport, AppError> {
    let mut orphaned = Vec::new();
    let mut dangling = Vec::new();

    for slot in FileSlot::ALL {
        let key = object_key(application.owner_id, slot);
        let reference = references.iter().find(|r| r.slot == slot);

        match reference {
            Some(reference) => {
                if !storage
                    .exists(&reference.object_key)
                    .await
                    .map_err(storage_error)?
                {
                    dangling.push(reference.clone());
                }
            }
            None => {
                if storage.exists(&key).await.map_err(storage_error)? {
                    orphaned.push(OrphanedObject {
                        owner_id: application.owner_id,
                        slot,
                        object_key: key,
                    });
                }
            }
        }
    }

    if !orphaned.is_empty() || !dangling.is_empty() {
        tracing::warn!(
            owner_id = %application.owner_id,
            orphaned = orphaned.len(),
            dangling = dangling.len(),
            "Storage and committed references disagree"
        );
    }

    Ok(ReconciliationReport {
        application_id: application.id,
        orphaned,
        dangling,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use admissions_core::models::ApplicationStatus;
    use admissions_storage::LocalStorage;
    use chrono::Utc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_reports_orphaned_and_dangling() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:3000".to_string(),
            b"reconciliation-test-secret-0123456789",
        )
        .await
        .unwrap();

        let owner_id = Uuid::new_v4();
        let application = Application {
            id: Uuid::new_v4(),
            owner_id,
            status: ApplicationStatus::Pending,
            report_status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // Uploaded and committed
        let certificate = object_key(owner_id, FileSlot::SchoolCertificate);
        storage.write_object(&certificate, b"certificate").await.unwrap();
        // Uploaded, never committed
        let grades = object_key(owner_id, FileSlot::Grades);
        storage.write_object(&grades, b"grades").await.unwrap();
        // Committed, object missing
        let report = object_key(owner_id, FileSlot::Report);

        let references = vec![
            StoredObjectReference {
                application_id: application.id,
                slot: FileSlot::SchoolCertificate,
                object_key: certificate,
                committed_at: Utc::now(),
            },
            StoredObjectReference {
                application_id: application.id,
                slot: FileSlot::Report,
                object_key: report.clone(),
                committed_at: Utc::now(),
            },
        ];

        let report_out = reconcile_application(&storage, &application, &references)
            .await
            .unwrap();

        assert_eq!(report_out.application_id, application.id);
        assert_eq!(report_out.orphaned.len(), 1);
        assert_eq!(report_out.orphaned[0].slot, FileSlot::Grades);
        assert_eq!(report_out.orphaned[0].object_key, grades);
        assert_eq!(report_out.dangling.len(), 1);
        assert_eq!(report_out.dangling[0].object_key, report);
    }
}
