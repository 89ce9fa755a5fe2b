//! In-memory stores for `DATABASE_URL=memory://` and tests.
//!
//! Same observable semantics as the PostgreSQL repositories: one application per
//! owner, one reference per slot with last write wins, and a closed gate by default.

use super::{ApplicationStore, SettingsStore};
use admissions_core::models::{
    Application, ApplicationStatus, ApplicationsOpen, FileSlot, ReviewStatusUpdate,
    StoredObjectReference,
};
use admissions_core::AppError;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct ApplicationState {
    applications: HashMap<Uuid, Application>,
    by_owner: HashMap<Uuid, Uuid>,
    files: HashMap<(Uuid, FileSlot), StoredObjectReference>,
}

#[derive(Default)]
pub struct InMemoryApplicationStore {
    state: RwLock<ApplicationState>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn create_or_get_draft(&self, owner_id: Uuid) -> Result<Application, AppError> {
        let mut state = self.state.write().await;

        if let Some(application) = state
            .by_owner
            .get(&owner_id)
            .and_then(|id| state.applications.get(id))
        {
            return Ok(application.clone());
        }

        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            owner_id,
            status: ApplicationStatus::Draft,
            report_status: None,
            created_at: now,
            updated_at: now,
        };
        state.by_owner.insert(owner_id, application.id);
        state
            .applications
            .insert(application.id, application.clone());

        Ok(application)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        Ok(self.state.read().await.applications.get(&id).cloned())
    }

    async fn get_by_owner(&self, owner_id: Uuid) -> Result<Option<Application>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .by_owner
            .get(&owner_id)
            .and_then(|id| state.applications.get(id))
            .cloned())
    }

    async fn list_files(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<StoredObjectReference>, AppError> {
        let state = self.state.read().await;
        Ok(FileSlot::ALL
            .iter()
            .filter_map(|slot| state.files.get(&(application_id, *slot)).cloned())
            .collect())
    }

    async fn attach_object(
        &self,
        application_id: Uuid,
        slot: FileSlot,
        object_key: &str,
    ) -> Result<StoredObjectReference, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let application = state.applications.get_mut(&application_id).ok_or_else(|| {
            AppError::NotFound(format!("Application {} not found", application_id))
        })?;
        application.updated_at = now;

        let reference = StoredObjectReference {
            application_id,
            slot,
            object_key: object_key.to_string(),
            committed_at: now,
        };
        state
            .files
            .insert((application_id, slot), reference.clone());

        Ok(reference)
    }

    async fn apply_status_update(
        &self,
        application_id: Uuid,
        update: ReviewStatusUpdate,
    ) -> Result<Application, AppError> {
        let mut state = self.state.write().await;

        let application = state.applications.get_mut(&application_id).ok_or_else(|| {
            AppError::NotFound(format!("Application {} not found", application_id))
        })?;

        match update {
            ReviewStatusUpdate::Status(status) => application.status = status,
            ReviewStatusUpdate::ReportStatus(report_status) => {
                application.report_status = Some(report_status)
            }
        }
        application.updated_at = Utc::now();

        Ok(application.clone())
    }
}

#[derive(Default)]
pub struct InMemorySettingsStore {
    applications_open: RwLock<ApplicationsOpen>,
}

impl InMemorySettingsStore {
    pub fn new(is_open: bool) -> Self {
        Self {
            applications_open: RwLock::new(ApplicationsOpen { is_open }),
        }
    }
}

#[async_trait::async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn applications_open(&self) -> Result<ApplicationsOpen, AppError> {
        Ok(*self.applications_open.read().await)
    }

    async fn set_applications_open(&self, is_open: bool) -> Result<ApplicationsOpen, AppError> {
        let mut value = self.applications_open.write().await;
        value.is_open = is_open;
        Ok(*value)
    }
}
