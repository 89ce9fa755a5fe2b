use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Overall review state of an application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Draft,
    Pending,
    Updated,
    Notified,
}

/// Review state of the candidate's report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "report_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Pending,
    Valid,
    NotValid,
}

/// Logical slot a stored object is attached to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "file_slot", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum FileSlot {
    SchoolCertificate,
    Grades,
    Report,
}

impl FileSlot {
    pub const ALL: [FileSlot; 3] = [FileSlot::SchoolCertificate, FileSlot::Grades, FileSlot::Report];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileSlot::SchoolCertificate => "school_certificate",
            FileSlot::Grades => "grades",
            FileSlot::Report => "report",
        }
    }

    /// Replacing this slot's content invalidates a previous review.
    pub fn resets_review_status(&self) -> bool {
        matches!(self, FileSlot::Report)
    }
}

impl Display for FileSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileSlot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school_certificate" => Ok(FileSlot::SchoolCertificate),
            "grades" => Ok(FileSlot::Grades),
            "report" => Ok(FileSlot::Report),
            _ => Err(anyhow::anyhow!("Invalid file slot: {}", s)),
        }
    }
}

/// Application entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Application {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub status: ApplicationStatus,
    pub report_status: Option<ReportStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Durable record that an object was transferred and attached to a slot.
///
/// There is at most one current reference per `(application_id, slot)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoredObjectReference {
    pub application_id: Uuid,
    pub slot: FileSlot,
    pub object_key: String,
    pub committed_at: DateTime<Utc>,
}

/// Application as returned by the API, with its current file references
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub status: ApplicationStatus,
    pub report_status: Option<ReportStatus>,
    pub files: Vec<StoredObjectReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationResponse {
    pub fn new(application: Application, files: Vec<StoredObjectReference>) -> Self {
        Self {
            id: application.id,
            owner_id: application.owner_id,
            status: application.status,
            report_status: application.report_status,
            files,
            created_at: application.created_at,
            updated_at: application.updated_at,
        }
    }

    pub fn file(&self, slot: FileSlot) -> Option<&StoredObjectReference> {
        self.files.iter().find(|f| f.slot == slot)
    }
}

/// Request to attach an uploaded object to an application slot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct AttachObjectRequest {
    #[validate(length(
        min = 1,
        max = 512,
        message = "Object key must be between 1 and 512 characters"
    ))]
    pub object_key: String,
}

/// A single status-field write.
///
/// Serialized as `{"field": "report_status", "value": "PENDING"}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ReviewStatusUpdate {
    Status(ApplicationStatus),
    ReportStatus(ReportStatus),
}

impl ReviewStatusUpdate {
    /// The only update an applicant may issue: sending a report back for review.
    pub fn is_report_reset(&self) -> bool {
        matches!(self, ReviewStatusUpdate::ReportStatus(ReportStatus::Pending))
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            ReviewStatusUpdate::Status(_) => "status",
            ReviewStatusUpdate::ReportStatus(_) => "report_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::NotValid).unwrap(),
            "\"NOT_VALID\""
        );
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Draft).unwrap(),
            "\"DRAFT\""
        );
    }

    #[test]
    fn test_review_status_update_wire_format() {
        let update: ReviewStatusUpdate =
            serde_json::from_str(r#"{"field":"report_status","value":"PENDING"}"#).unwrap();
        assert_eq!(update, ReviewStatusUpdate::ReportStatus(ReportStatus::Pending));
        assert!(update.is_report_reset());

        let update: ReviewStatusUpdate =
            serde_json::from_str(r#"{"field":"status","value":"NOTIFIED"}"#).unwrap();
        assert_eq!(update, ReviewStatusUpdate::Status(ApplicationStatus::Notified));
        assert!(!update.is_report_reset());
        assert_eq!(update.field_name(), "status");
    }

    #[test]
    fn test_file_slot_round_trip_through_str() {
        for slot in FileSlot::ALL {
            assert_eq!(slot.as_str().parse::<FileSlot>().unwrap(), slot);
        }
        assert!("transcript".parse::<FileSlot>().is_err());
        assert!(FileSlot::Report.resets_review_status());
        assert!(!FileSlot::Grades.resets_review_status());
    }
}
