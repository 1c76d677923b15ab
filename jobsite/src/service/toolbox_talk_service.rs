use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::pagination::{PageRequest, Paginated};
use crate::repository::toolbox_talk_repository::ToolboxTalkRepository;
use crate::service::required_text;
use crate::types::{non_blank, ToolboxTalk, ToolboxTalkInput};
use log::debug;
use std::sync::Arc;

/// Safety briefings written by admins. Contractors only see published ones.
pub struct ToolboxTalkService {
    talk_repo: Arc<dyn ToolboxTalkRepository>,
}

impl ToolboxTalkService {
    pub fn new(talk_repo: Arc<dyn ToolboxTalkRepository>) -> Self {
        Self { talk_repo }
    }

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails
    pub fn list(
        &self,
        principal: &Principal,
        search: Option<&str>,
        page: &PageRequest,
    ) -> Result<Paginated<ToolboxTalk>, JobsiteError> {
        let (rows, total) = self.talk_repo.list(
            principal.company_id(),
            search,
            !principal.is_admin(),
            page,
        )?;
        Ok(Paginated::new(rows, total, page))
    }

    /// # Errors
    /// Returns `NotFound`, also for drafts requested by a contractor
    pub fn get(&self, principal: &Principal, id: i64) -> Result<ToolboxTalk, JobsiteError> {
        self.talk_repo
            .find_by_id(principal.company_id(), id)?
            .filter(|talk| talk.published || principal.is_admin())
            .ok_or_else(|| JobsiteError::not_found("Toolbox talk", id))
    }

    /// # Errors
    /// `Forbidden` or `BadInput`
    pub fn create(
        &self,
        principal: &Principal,
        input: &ToolboxTalkInput,
    ) -> Result<ToolboxTalk, JobsiteError> {
        let admin_id = principal.require_admin()?;
        let talk = self
            .talk_repo
            .insert(principal.company_id(), admin_id, &validated(input)?)?;
        debug!("Admin {admin_id} wrote toolbox talk {}", talk.id);
        Ok(talk)
    }

    /// # Errors
    /// `Forbidden`, `BadInput` or `NotFound`
    pub fn update(
        &self,
        principal: &Principal,
        id: i64,
        input: &ToolboxTalkInput,
    ) -> Result<ToolboxTalk, JobsiteError> {
        principal.require_admin()?;
        self.talk_repo
            .update(principal.company_id(), id, &validated(input)?)?
            .ok_or_else(|| JobsiteError::not_found("Toolbox talk", id))
    }

    /// # Errors
    /// `Forbidden` or `NotFound`
    pub fn delete(&self, principal: &Principal, id: i64) -> Result<(), JobsiteError> {
        principal.require_admin()?;
        if self.talk_repo.delete(principal.company_id(), id)? {
            Ok(())
        } else {
            Err(JobsiteError::not_found("Toolbox talk", id))
        }
    }
}

fn validated(input: &ToolboxTalkInput) -> Result<ToolboxTalkInput, JobsiteError> {
    Ok(ToolboxTalkInput {
        title: required_text(&input.title, "Title")?,
        topic: non_blank(input.topic.as_ref()),
        content: required_text(&input.content, "Content")?,
        published: input.published,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::MembershipTier;

    #[test]
    fn test_contractors_do_not_see_drafts() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let admin = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let contractor = Principal::Contractor {
            contractor_id: 7,
            company_id: company.id,
        };
        let service = ToolboxTalkService::new(db_manager.create_toolbox_talk_repository());

        let draft = service.create(
            &admin,
            &ToolboxTalkInput {
                title: "Ladder safety".to_string(),
                content: "Three points of contact".to_string(),
                ..Default::default()
            },
        )?;
        service.create(
            &admin,
            &ToolboxTalkInput {
                title: "Heat stress".to_string(),
                topic: Some(" ".to_string()),
                content: "Drink water".to_string(),
                published: true,
            },
        )?;

        assert_eq!(service.list(&admin, None, &PageRequest::default())?.pagination.total, 2);
        assert_eq!(service.list(&contractor, None, &PageRequest::default())?.pagination.total, 1);
        assert!(matches!(
            service.get(&contractor, draft.id),
            Err(JobsiteError::NotFound { .. })
        ));
        assert!(matches!(
            service.create(&contractor, &ToolboxTalkInput::default()),
            Err(JobsiteError::Forbidden(_))
        ));
        assert!(matches!(
            service.create(&admin, &ToolboxTalkInput::default()),
            Err(JobsiteError::BadInput(_))
        ));

        let published = service.update(
            &admin,
            draft.id,
            &ToolboxTalkInput {
                published: true,
                ..ToolboxTalkInput {
                    title: draft.title.clone(),
                    topic: draft.topic.clone(),
                    content: draft.content.clone(),
                    published: false,
                }
            },
        )?;
        assert!(published.published);
        assert_eq!(service.get(&contractor, draft.id)?.id, draft.id);
        Ok(())
    }
}
