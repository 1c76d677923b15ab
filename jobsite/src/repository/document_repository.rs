use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::types::ProjectDocument;

/// Document metadata; the file itself lives in the blob store
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub project_id: i64,
    pub name: String,
    pub category: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub uploaded_by: i64,
}

pub trait DocumentRepository: Send + Sync {
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn insert(&self, company_id: i64, document: &NewDocument)
        -> Result<ProjectDocument, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_id(
        &self,
        company_id: i64,
        project_id: i64,
        document_id: i64,
    ) -> Result<Option<ProjectDocument>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn list(
        &self,
        company_id: i64,
        project_id: i64,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<(Vec<ProjectDocument>, i64), JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the delete fails.
    fn delete(&self, company_id: i64, project_id: i64, document_id: i64)
        -> Result<bool, JobsiteError>;
}
