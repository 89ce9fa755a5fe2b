use admissions_core::constants::APPLICATIONS_OPEN_SETTING;
use admissions_core::models::ApplicationsOpen;
use admissions_core::AppError;
use sqlx::{PgPool, Row};

/// Portal-wide settings
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    /// Current value of the submissions gate. A missing row reads as closed.
    async fn applications_open(&self) -> Result<ApplicationsOpen, AppError>;

    async fn set_applications_open(&self, is_open: bool) -> Result<ApplicationsOpen, AppError>;
}

/// PostgreSQL settings repository
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SettingsStore for SettingsRepository {
    async fn applications_open(&self) -> Result<ApplicationsOpen, AppError> {
        let row = sqlx::query("SELECT value FROM portal_settings WHERE key = $1")
            .bind(APPLICATIONS_OPEN_SETTING)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let value: serde_json::Value = row.try_get("value")?;
                Ok(serde_json::from_value(value)?)
            }
            None => Ok(ApplicationsOpen::default()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn set_applications_open(&self, is_open: bool) -> Result<ApplicationsOpen, AppError> {
        let value = ApplicationsOpen { is_open };

        sqlx::query(
            r#"
            INSERT INTO portal_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(APPLICATIONS_OPEN_SETTING)
        .bind(serde_json::to_value(value)?)
        .execute(&self.pool)
        .await?;

        tracing::info!(is_open, "Applications gate updated");

        Ok(value)
    }
}
