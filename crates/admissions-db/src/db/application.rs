use admissions_core::models::{
    Application, FileSlot, ReviewStatusUpdate, StoredObjectReference,
};
use admissions_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Persistence for applications and their committed file references
///
/// Every write is a single statement. Nothing here spans object storage, so a failed
/// write after a successful upload surfaces to the caller as-is.
#[async_trait::async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Return the owner's application, creating a draft if none exists
    async fn create_or_get_draft(&self, owner_id: Uuid) -> Result<Application, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Application>, AppError>;

    async fn get_by_owner(&self, owner_id: Uuid) -> Result<Option<Application>, AppError>;

    async fn list_files(&self, application_id: Uuid)
        -> Result<Vec<StoredObjectReference>, AppError>;

    /// Upsert the slot's reference. Last write wins.
    async fn attach_object(
        &self,
        application_id: Uuid,
        slot: FileSlot,
        object_key: &str,
    ) -> Result<StoredObjectReference, AppError>;

    /// Set one status field. Idempotent; `NotFound` if the application is missing.
    async fn apply_status_update(
        &self,
        application_id: Uuid,
        update: ReviewStatusUpdate,
    ) -> Result<Application, AppError>;
}

const APPLICATION_COLUMNS: &str = "id, owner_id, status, report_status, created_at, updated_at";

/// PostgreSQL application repository
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ApplicationStore for ApplicationRepository {
    #[tracing::instrument(skip(self))]
    async fn create_or_get_draft(&self, owner_id: Uuid) -> Result<Application, AppError> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (id, owner_id, status)
            VALUES ($1, $2, 'DRAFT')
            ON CONFLICT (owner_id) DO UPDATE SET owner_id = EXCLUDED.owner_id
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(application)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    async fn get_by_owner(&self, owner_id: Uuid) -> Result<Option<Application>, AppError> {
        let application = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE owner_id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    async fn list_files(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<StoredObjectReference>, AppError> {
        let files = sqlx::query_as::<_, StoredObjectReference>(
            r#"
            SELECT application_id, slot, object_key, committed_at
            FROM application_files
            WHERE application_id = $1
            ORDER BY slot
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    #[tracing::instrument(skip(self), fields(slot = %slot))]
    async fn attach_object(
        &self,
        application_id: Uuid,
        slot: FileSlot,
        object_key: &str,
    ) -> Result<StoredObjectReference, AppError> {
        let reference = sqlx::query_as::<_, StoredObjectReference>(
            r#"
            WITH touched AS (
                UPDATE applications SET updated_at = NOW() WHERE id = $1
            )
            INSERT INTO application_files (application_id, slot, object_key, committed_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (application_id, slot)
            DO UPDATE SET object_key = EXCLUDED.object_key, committed_at = EXCLUDED.committed_at
            RETURNING application_id, slot, object_key, committed_at
            "#,
        )
        .bind(application_id)
        .bind(slot)
        .bind(object_key)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            application_id = %application_id,
            object_key = %object_key,
            "Object reference committed"
        );

        Ok(reference)
    }

    #[tracing::instrument(skip(self), fields(field = update.field_name()))]
    async fn apply_status_update(
        &self,
        application_id: Uuid,
        update: ReviewStatusUpdate,
    ) -> Result<Application, AppError> {
        // Field names are the column names
        let sql = format!(
            "UPDATE applications SET {} = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            update.field_name(),
            APPLICATION_COLUMNS
        );

        let query = sqlx::query_as::<_, Application>(&sql).bind(application_id);
        let query = match update {
            ReviewStatusUpdate::Status(status) => query.bind(status),
            ReviewStatusUpdate::ReportStatus(report_status) => query.bind(report_status),
        };

        query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {} not found", application_id)))
    }
}
