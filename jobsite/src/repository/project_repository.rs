use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::types::{Project, ProjectInput, ProjectStatus};

/// Conditions of the project list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    /// Substring of the name or the project number, case-insensitive
    pub search: Option<String>,
    pub status: Option<ProjectStatus>,
}

/// All operations are scoped by `company_id`; rows of other companies are never visible.
#[cfg_attr(test, mockall::automock)]
pub trait ProjectRepository: Send + Sync {
    /// Inserts the project unless the company's tier allows no more, the count
    /// and the insert share one transaction.
    ///
    /// # Errors
    /// `NotFound` for an unknown company, `ProjectLimitReached` at the tier limit,
    /// `Conflict` when the name is taken and `Sql` if the insert fails.
    fn insert(&self, company_id: i64, input: &ProjectInput) -> Result<Project, JobsiteError>;

    /// Replaces the fields of a project, returns `None` if it does not exist.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn update(
        &self,
        company_id: i64,
        project_id: i64,
        input: &ProjectInput,
    ) -> Result<Option<Project>, JobsiteError>;

    /// Deletes the project together with its documents and subcontractor links,
    /// in a single transaction. Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    /// `Conflict` while timesheets reference the project, `Sql` if any of the
    /// statements fail.
    fn delete(&self, company_id: i64, project_id: i64) -> Result<bool, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_id(&self, company_id: i64, project_id: i64)
        -> Result<Option<Project>, JobsiteError>;

    /// Case-insensitive lookup on the trimmed name.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_name(&self, company_id: i64, name: &str) -> Result<Option<Project>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn count_for_company(&self, company_id: i64) -> Result<i64, JobsiteError>;

    /// Returns one page of projects and the total number of matching rows.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn list(
        &self,
        company_id: i64,
        filter: &ProjectFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Project>, i64), JobsiteError>;

}
