pub mod company_service;
pub mod contractor_service;
pub mod document_service;
pub mod payroll_service;
pub mod project_service;
pub mod subcontractor_service;
pub mod submission_service;
pub mod timesheet_service;
pub mod toolbox_talk_service;
pub mod upload_service;

use crate::error::JobsiteError;
use crate::types::non_blank;

/// Returns the trimmed value of a required text field
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, JobsiteError> {
    non_blank(Some(&value.to_string()))
        .ok_or_else(|| JobsiteError::BadInput(format!("{field} is required")))
}
