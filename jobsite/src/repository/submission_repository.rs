use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::types::{Submission, SubmissionStatus, SubmissionType};
use chrono::NaiveDate;

/// Conditions of the submission and incident list endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionFilter {
    pub submission_type: Option<SubmissionType>,
    pub status: Option<SubmissionStatus>,
    pub project_id: Option<i64>,
    /// Restricts the result to the submissions of one contractor
    pub contractor_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// A validated submission ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub contractor_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub project_id: Option<i64>,
    pub submission_type: SubmissionType,
    pub status: SubmissionStatus,
    pub form_data: serde_json::Value,
}

pub trait SubmissionRepository: Send + Sync {
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn insert(&self, company_id: i64, submission: &NewSubmission)
        -> Result<Submission, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_id(
        &self,
        company_id: i64,
        submission_id: i64,
    ) -> Result<Option<Submission>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn list(
        &self,
        company_id: i64,
        filter: &SubmissionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Submission>, i64), JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn update_status(
        &self,
        company_id: i64,
        submission_id: i64,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the delete fails.
    fn delete(&self, company_id: i64, submission_id: i64) -> Result<bool, JobsiteError>;
}
