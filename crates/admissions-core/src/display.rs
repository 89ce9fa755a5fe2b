//! Status banner selection.
//!
//! A pure mapping from the applicant's situation to what the portal shows them. All
//! inputs are explicit, so every combination can be tested without a rendering context.

use crate::models::{ApplicationStatus, ReportStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusInputs {
    pub has_application: bool,
    pub application_status: Option<ApplicationStatus>,
    pub report_status: Option<ReportStatus>,
    pub applications_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

/// Next step offered to the applicant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusAction {
    StartApplication,
    ContinueApplication,
    UploadReport,
    ReplaceReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusContent {
    pub tone: Tone,
    pub title: String,
    pub message: String,
    pub action: Option<StatusAction>,
}

impl StatusContent {
    fn new(tone: Tone, title: &str, message: &str, action: Option<StatusAction>) -> Self {
        Self {
            tone,
            title: title.to_string(),
            message: message.to_string(),
            action,
        }
    }
}

/// Select the banner for the given inputs. Deterministic.
///
/// Actions that start a submission are only offered while applications are open.
pub fn select_status_content(inputs: StatusInputs) -> StatusContent {
    let open = inputs.applications_open;
    let when_open = |action: StatusAction| open.then_some(action);

    let status = match (inputs.has_application, inputs.application_status) {
        (true, Some(status)) => status,
        _ if open => {
            return StatusContent::new(
                Tone::Info,
                "Applications are open",
                "Start your application and upload your school certificate and grades.",
                Some(StatusAction::StartApplication),
            )
        }
        _ => {
            return StatusContent::new(
                Tone::Info,
                "Applications are closed",
                "New applications are not being accepted at the moment.",
                None,
            )
        }
    };

    match status {
        ApplicationStatus::Draft if open => StatusContent::new(
            Tone::Warning,
            "Application not submitted",
            "Your application is still a draft. Complete it and upload your documents.",
            Some(StatusAction::ContinueApplication),
        ),
        ApplicationStatus::Draft => StatusContent::new(
            Tone::Error,
            "Application incomplete",
            "Applications closed before your draft was submitted.",
            None,
        ),
        ApplicationStatus::Pending => StatusContent::new(
            Tone::Info,
            "Application under review",
            "Your documents were received and are being reviewed.",
            None,
        ),
        ApplicationStatus::Updated => StatusContent::new(
            Tone::Info,
            "Application updated",
            "Your changes were received and will be reviewed again.",
            None,
        ),
        ApplicationStatus::Notified => match inputs.report_status {
            None => StatusContent::new(
                Tone::Success,
                "Decision available",
                "You have been notified of the decision. Upload your report to continue.",
                when_open(StatusAction::UploadReport),
            ),
            Some(ReportStatus::Pending) => StatusContent::new(
                Tone::Info,
                "Report under review",
                "Your report was received and is waiting for review.",
                None,
            ),
            Some(ReportStatus::Valid) => StatusContent::new(
                Tone::Success,
                "Report accepted",
                "Your report was accepted. Replacing it sends it back for review.",
                when_open(StatusAction::ReplaceReport),
            ),
            Some(ReportStatus::NotValid) => StatusContent::new(
                Tone::Error,
                "Report rejected",
                "Your report was not accepted. Upload a corrected report.",
                when_open(StatusAction::ReplaceReport),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(
        application_status: Option<ApplicationStatus>,
        report_status: Option<ReportStatus>,
        applications_open: bool,
    ) -> StatusInputs {
        StatusInputs {
            has_application: application_status.is_some(),
            application_status,
            report_status,
            applications_open,
        }
    }

    #[test]
    fn test_no_application() {
        let open = select_status_content(inputs(None, None, true));
        assert_eq!(open.action, Some(StatusAction::StartApplication));

        let closed = select_status_content(inputs(None, None, false));
        assert_eq!(closed.title, "Applications are closed");
        assert_eq!(closed.action, None);
    }

    #[test]
    fn test_has_application_flag_without_status_is_treated_as_none() {
        let content = select_status_content(StatusInputs {
            has_application: true,
            application_status: None,
            report_status: None,
            applications_open: false,
        });
        assert_eq!(content.title, "Applications are closed");
    }

    #[test]
    fn test_draft_depends_on_gate() {
        let open = select_status_content(inputs(Some(ApplicationStatus::Draft), None, true));
        assert_eq!(open.tone, Tone::Warning);
        assert_eq!(open.action, Some(StatusAction::ContinueApplication));

        let closed = select_status_content(inputs(Some(ApplicationStatus::Draft), None, false));
        assert_eq!(closed.tone, Tone::Error);
        assert_eq!(closed.action, None);
    }

    #[test]
    fn test_notified_report_states() {
        let rejected = select_status_content(inputs(
            Some(ApplicationStatus::Notified),
            Some(ReportStatus::NotValid),
            true,
        ));
        assert_eq!(rejected.tone, Tone::Error);
        assert_eq!(rejected.action, Some(StatusAction::ReplaceReport));

        let pending = select_status_content(inputs(
            Some(ApplicationStatus::Notified),
            Some(ReportStatus::Pending),
            true,
        ));
        assert_eq!(pending.action, None);

        let awaiting = select_status_content(inputs(Some(ApplicationStatus::Notified), None, false));
        assert_eq!(awaiting.tone, Tone::Success);
        assert_eq!(awaiting.action, None);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let statuses = [
            None,
            Some(ApplicationStatus::Draft),
            Some(ApplicationStatus::Pending),
            Some(ApplicationStatus::Updated),
            Some(ApplicationStatus::Notified),
        ];
        let reports = [
            None,
            Some(ReportStatus::Pending),
            Some(ReportStatus::Valid),
            Some(ReportStatus::NotValid),
        ];
        for status in statuses {
            for report in reports {
                for open in [true, false] {
                    let i = inputs(status, report, open);
                    let content = select_status_content(i);
                    assert_eq!(content, select_status_content(i));
                    if !open {
                        assert!(content.action.is_none());
                    }
                }
            }
        }
    }
}
