use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::pagination::{PageRequest, Paginated};
use crate::repository::project_repository::ProjectRepository;
use crate::repository::subcontractor_repository::SubcontractorRepository;
use crate::service::required_text;
use crate::types::{non_blank, Subcontractor, SubcontractorInput};
use log::debug;
use std::sync::Arc;

pub struct SubcontractorService {
    subcontractor_repo: Arc<dyn SubcontractorRepository>,
    project_repo: Arc<dyn ProjectRepository>,
}

impl SubcontractorService {
    pub fn new(
        subcontractor_repo: Arc<dyn SubcontractorRepository>,
        project_repo: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            subcontractor_repo,
            project_repo,
        }
    }

    /// # Errors
    /// Returns `Forbidden` for contractors
    pub fn list(
        &self,
        principal: &Principal,
        search: Option<&str>,
        page: &PageRequest,
    ) -> Result<Paginated<Subcontractor>, JobsiteError> {
        principal.require_admin()?;
        let (rows, total) = self
            .subcontractor_repo
            .list(principal.company_id(), search, page)?;
        Ok(Paginated::new(rows, total, page))
    }

    /// # Errors
    /// `BadInput` without a name, `Conflict` when the name is taken
    pub fn create(
        &self,
        principal: &Principal,
        input: &SubcontractorInput,
    ) -> Result<Subcontractor, JobsiteError> {
        principal.require_admin()?;
        let input = self.validated(principal.company_id(), None, input)?;
        self.subcontractor_repo.insert(principal.company_id(), &input)
    }

    /// # Errors
    /// Returns `NotFound` if the subcontractor is not in the caller's company
    pub fn get(&self, principal: &Principal, id: i64) -> Result<Subcontractor, JobsiteError> {
        principal.require_admin()?;
        self.subcontractor_repo
            .find_by_id(principal.company_id(), id)?
            .ok_or_else(|| JobsiteError::not_found("Subcontractor", id))
    }

    /// # Errors
    /// `NotFound`, `BadInput` or `Conflict`
    pub fn update(
        &self,
        principal: &Principal,
        id: i64,
        input: &SubcontractorInput,
    ) -> Result<Subcontractor, JobsiteError> {
        principal.require_admin()?;
        let input = self.validated(principal.company_id(), Some(id), input)?;
        self.subcontractor_repo
            .update(principal.company_id(), id, &input)?
            .ok_or_else(|| JobsiteError::not_found("Subcontractor", id))
    }

    /// Deletes the subcontractor; its contractors stay, unassigned
    ///
    /// # Errors
    /// Returns `NotFound` if there is no such subcontractor
    pub fn delete(&self, principal: &Principal, id: i64) -> Result<(), JobsiteError> {
        principal.require_admin()?;
        if self.subcontractor_repo.delete(principal.company_id(), id)? {
            Ok(())
        } else {
            Err(JobsiteError::not_found("Subcontractor", id))
        }
    }

    /// Subcontractors working on the project
    ///
    /// # Errors
    /// Returns `NotFound` if the project is not in the caller's company
    pub fn for_project(
        &self,
        principal: &Principal,
        project_id: i64,
    ) -> Result<Vec<Subcontractor>, JobsiteError> {
        principal.require_admin()?;
        self.require_project(principal.company_id(), project_id)?;
        self.subcontractor_repo
            .find_by_project(principal.company_id(), project_id)
    }

    /// Links the subcontractor to the project. Linking twice is harmless.
    ///
    /// # Errors
    /// Returns `NotFound` if either side does not exist in the caller's company
    pub fn attach(
        &self,
        principal: &Principal,
        project_id: i64,
        subcontractor_id: i64,
    ) -> Result<Vec<Subcontractor>, JobsiteError> {
        let company_id = principal.company_id();
        self.get(principal, subcontractor_id)?;
        self.require_project(company_id, project_id)?;
        self.subcontractor_repo
            .attach_to_project(project_id, subcontractor_id)?;
        debug!("Attached subcontractor {subcontractor_id} to project {project_id}");
        self.subcontractor_repo.find_by_project(company_id, project_id)
    }

    /// # Errors
    /// Returns `NotFound` if the project or the link does not exist
    pub fn detach(
        &self,
        principal: &Principal,
        project_id: i64,
        subcontractor_id: i64,
    ) -> Result<(), JobsiteError> {
        principal.require_admin()?;
        self.require_project(principal.company_id(), project_id)?;
        if self
            .subcontractor_repo
            .detach_from_project(project_id, subcontractor_id)?
        {
            Ok(())
        } else {
            Err(JobsiteError::not_found("Subcontractor", subcontractor_id))
        }
    }

    fn require_project(&self, company_id: i64, project_id: i64) -> Result<(), JobsiteError> {
        self.project_repo
            .find_by_id(company_id, project_id)?
            .map(|_| ())
            .ok_or_else(|| JobsiteError::not_found("Project", project_id))
    }

    fn validated(
        &self,
        company_id: i64,
        id: Option<i64>,
        input: &SubcontractorInput,
    ) -> Result<SubcontractorInput, JobsiteError> {
        let name = required_text(&input.name, "Subcontractor name")?;
        if let Some(existing) = self.subcontractor_repo.find_by_name(company_id, &name)? {
            if Some(existing.id) != id {
                return Err(JobsiteError::Conflict(format!(
                    "A subcontractor named '{name}' already exists"
                )));
            }
        }
        Ok(SubcontractorInput {
            name,
            contact_name: non_blank(input.contact_name.as_ref()),
            contact_email: non_blank(input.contact_email.as_ref()),
            contact_phone: non_blank(input.contact_phone.as_ref()),
            trade: non_blank(input.trade.as_ref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::database_manager::DatabaseManager;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::{MembershipTier, ProjectInput};

    fn service(db_manager: &DatabaseManager) -> SubcontractorService {
        SubcontractorService::new(
            db_manager.create_subcontractor_repository(),
            db_manager.create_project_repository(),
        )
    }

    fn input(name: &str) -> SubcontractorInput {
        SubcontractorInput {
            name: name.to_string(),
            contact_email: Some("  ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_names() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let principal = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let service = service(&db_manager);

        let sparks = service.create(&principal, &input("Sparks Ltd"))?;
        assert_eq!(sparks.contact_email, None);
        assert!(matches!(
            service.create(&principal, &input("sparks ltd")),
            Err(JobsiteError::Conflict(_))
        ));
        // Keeping its own name is fine
        service.update(&principal, sparks.id, &input("Sparks Ltd"))?;
        Ok(())
    }

    #[test]
    fn test_attach_requires_both_sides() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let principal = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let project = db_manager.create_project_repository().insert(
            company.id,
            &ProjectInput {
                name: "Bridge".to_string(),
                ..Default::default()
            },
        )?;
        let service = service(&db_manager);
        let sparks = service.create(&principal, &input("Sparks Ltd"))?;

        assert!(matches!(
            service.attach(&principal, 999, sparks.id),
            Err(JobsiteError::NotFound { .. })
        ));
        let linked = service.attach(&principal, project.id, sparks.id)?;
        assert_eq!(linked.len(), 1);

        service.detach(&principal, project.id, sparks.id)?;
        assert!(matches!(
            service.detach(&principal, project.id, sparks.id),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }
}
