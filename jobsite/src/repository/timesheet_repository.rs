use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::types::{Timesheet, TimesheetInput, TimesheetStatus, TimesheetStatusSummary};
use chrono::{DateTime, NaiveDate, Utc};

/// Conditions of the timesheet list endpoint, all optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimesheetFilter {
    pub status: Option<TimesheetStatus>,
    pub project_id: Option<i64>,
    pub contractor_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// The outcome of an admin reviewing a timesheet
#[derive(Debug, Clone, PartialEq)]
pub struct TimesheetReview {
    pub status: TimesheetStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: i64,
    pub reviewed_at: DateTime<Utc>,
}

pub trait TimesheetRepository: Send + Sync {
    /// Inserts a pending timesheet for the contractor.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn insert(
        &self,
        company_id: i64,
        contractor_id: i64,
        input: &TimesheetInput,
    ) -> Result<Timesheet, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn update(
        &self,
        company_id: i64,
        timesheet_id: i64,
        input: &TimesheetInput,
    ) -> Result<Option<Timesheet>, JobsiteError>;

    /// Stores the review, guarded by the expected current status so that two
    /// concurrent reviews can not both succeed. Returns `None` if the row was not
    /// in `expected` state any more.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn review(
        &self,
        company_id: i64,
        timesheet_id: i64,
        expected: TimesheetStatus,
        review: &TimesheetReview,
    ) -> Result<Option<Timesheet>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the delete fails.
    fn delete(&self, company_id: i64, timesheet_id: i64) -> Result<bool, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_id(
        &self,
        company_id: i64,
        timesheet_id: i64,
    ) -> Result<Option<Timesheet>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn list(
        &self,
        company_id: i64,
        filter: &TimesheetFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Timesheet>, i64), JobsiteError>;

    /// Approved timesheets of the project with `work_date` in `from..=to`, ordered by date.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_approved_for_project(
        &self,
        company_id: i64,
        project_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Timesheet>, JobsiteError>;

    /// Count and sum of hours per status, optionally limited to a date range.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn summary(
        &self,
        company_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TimesheetStatusSummary>, JobsiteError>;
}
