use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::types::{ToolboxTalk, ToolboxTalkInput};

pub trait ToolboxTalkRepository: Send + Sync {
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn insert(
        &self,
        company_id: i64,
        created_by: i64,
        input: &ToolboxTalkInput,
    ) -> Result<ToolboxTalk, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn update(
        &self,
        company_id: i64,
        talk_id: i64,
        input: &ToolboxTalkInput,
    ) -> Result<Option<ToolboxTalk>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the delete fails.
    fn delete(&self, company_id: i64, talk_id: i64) -> Result<bool, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_by_id(&self, company_id: i64, talk_id: i64)
        -> Result<Option<ToolboxTalk>, JobsiteError>;

    /// Lists talks matching `search` in title or topic; `published_only` hides drafts.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn list(
        &self,
        company_id: i64,
        search: Option<&str>,
        published_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<ToolboxTalk>, i64), JobsiteError>;
}
