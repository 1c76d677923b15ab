use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::types::{Subcontractor, SubcontractorInput};

pub trait SubcontractorRepository: Send + Sync {
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn insert(
        &self,
        company_id: i64,
        input: &SubcontractorInput,
    ) -> Result<Subcontractor, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn update(
        &self,
        company_id: i64,
        subcontractor_id: i64,
        input: &SubcontractorInput,
    ) -> Result<Option<Subcontractor>, JobsiteError>;

    /// Deletes the subcontractor and its project links. Contractors working for it
    /// are detached, not deleted.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if any of the statements fail.
    fn delete(&self, company_id: i64, subcontractor_id: i64) -> Result<bool, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_id(
        &self,
        company_id: i64,
        subcontractor_id: i64,
    ) -> Result<Option<Subcontractor>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_name(
        &self,
        company_id: i64,
        name: &str,
    ) -> Result<Option<Subcontractor>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn list(
        &self,
        company_id: i64,
        search: Option<&str>,
        page: &PageRequest,
    ) -> Result<(Vec<Subcontractor>, i64), JobsiteError>;

    /// Links the subcontractor to the project, linking twice is a no-op.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn attach_to_project(&self, project_id: i64, subcontractor_id: i64)
        -> Result<(), JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the delete fails.
    fn detach_from_project(
        &self,
        project_id: i64,
        subcontractor_id: i64,
    ) -> Result<bool, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_project(
        &self,
        company_id: i64,
        project_id: i64,
    ) -> Result<Vec<Subcontractor>, JobsiteError>;
}
