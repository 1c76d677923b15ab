use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::types::{Contractor, ContractorInput};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractorFilter {
    /// Matches first name, last name or email
    pub search: Option<String>,
    pub active: Option<bool>,
    pub subcontractor_id: Option<i64>,
}

#[cfg_attr(test, mockall::automock)]
pub trait ContractorRepository: Send + Sync {
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn insert(&self, company_id: i64, input: &ContractorInput) -> Result<Contractor, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn update(
        &self,
        company_id: i64,
        contractor_id: i64,
        input: &ContractorInput,
    ) -> Result<Option<Contractor>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the delete fails.
    fn delete(&self, company_id: i64, contractor_id: i64) -> Result<bool, JobsiteError>;

    /// Marks the contractor inactive, keeping the row for historic timesheets.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn deactivate(&self, company_id: i64, contractor_id: i64) -> Result<bool, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_id(
        &self,
        company_id: i64,
        contractor_id: i64,
    ) -> Result<Option<Contractor>, JobsiteError>;

    /// Case-insensitive lookup of the email address within the company.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_email(&self, company_id: i64, email: &str)
        -> Result<Option<Contractor>, JobsiteError>;

    /// Fetches the contractors with the given ids, silently skipping unknown ids.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_ids(&self, company_id: i64, ids: &[i64]) -> Result<Vec<Contractor>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn list(
        &self,
        company_id: i64,
        filter: &ContractorFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Contractor>, i64), JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn has_timesheets(&self, company_id: i64, contractor_id: i64) -> Result<bool, JobsiteError>;
}
