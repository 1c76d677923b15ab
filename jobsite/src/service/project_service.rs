//! Projects of a company. Names are unique per company and the number of
//! projects is bounded by the membership tier.
use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::pagination::{PageRequest, Paginated};
use crate::repository::project_repository::{ProjectFilter, ProjectRepository};
use crate::service::required_text;
use crate::types::{non_blank, Project, ProjectInput};
use log::info;
use std::sync::Arc;

pub struct ProjectService {
    project_repo: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(project_repo: Arc<dyn ProjectRepository>) -> Self {
        Self { project_repo }
    }

    /// # Errors
    /// Returns `Forbidden` for contractors
    pub fn list(
        &self,
        principal: &Principal,
        filter: &ProjectFilter,
        page: &PageRequest,
    ) -> Result<Paginated<Project>, JobsiteError> {
        principal.require_admin()?;
        let (projects, total) = self.project_repo.list(principal.company_id(), filter, page)?;
        Ok(Paginated::new(projects, total, page))
    }

    /// Creates a project, enforcing unique names and the tier's project limit
    ///
    /// # Errors
    /// `BadInput` for invalid fields, `Conflict` for a duplicate name and
    /// `ProjectLimitReached` when the tier allows no more projects
    pub fn create(&self, principal: &Principal, input: &ProjectInput) -> Result<Project, JobsiteError> {
        principal.require_admin()?;
        let company_id = principal.company_id();
        let input = normalized(input)?;

        if self.project_repo.find_by_name(company_id, &input.name)?.is_some() {
            return Err(duplicate_name(&input.name));
        }
        // The repository checks the tier limit in the insert transaction
        let project = self.project_repo.insert(company_id, &input)?;
        info!("Created project {} '{}' for company {company_id}", project.id, project.name);
        Ok(project)
    }

    /// Any principal of the company may read a project
    ///
    /// # Errors
    /// Returns `NotFound` if the project is not in the caller's company
    pub fn get(&self, principal: &Principal, project_id: i64) -> Result<Project, JobsiteError> {
        self.project_repo
            .find_by_id(principal.company_id(), project_id)?
            .ok_or_else(|| JobsiteError::not_found("Project", project_id))
    }

    /// # Errors
    /// `NotFound`, `BadInput` or `Conflict` when the new name is taken by another project
    pub fn update(
        &self,
        principal: &Principal,
        project_id: i64,
        input: &ProjectInput,
    ) -> Result<Project, JobsiteError> {
        principal.require_admin()?;
        let company_id = principal.company_id();
        let input = normalized(input)?;

        if let Some(other) = self.project_repo.find_by_name(company_id, &input.name)? {
            if other.id != project_id {
                return Err(duplicate_name(&input.name));
            }
        }
        self.project_repo
            .update(company_id, project_id, &input)?
            .ok_or_else(|| JobsiteError::not_found("Project", project_id))
    }

    /// Deletes the project with its documents and subcontractor links
    ///
    /// # Errors
    /// `NotFound`, or `Conflict` while timesheets still reference the project
    pub fn delete(&self, principal: &Principal, project_id: i64) -> Result<(), JobsiteError> {
        principal.require_admin()?;
        let company_id = principal.company_id();
        self.get(principal, project_id)?;
        if !self.project_repo.delete(company_id, project_id)? {
            return Err(JobsiteError::not_found("Project", project_id));
        }
        info!("Deleted project {project_id} of company {company_id}");
        Ok(())
    }
}

fn duplicate_name(name: &str) -> JobsiteError {
    JobsiteError::Conflict(format!("A project named '{name}' already exists"))
}

fn normalized(input: &ProjectInput) -> Result<ProjectInput, JobsiteError> {
    let name = required_text(&input.name, "Project name")?;
    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end < start {
            return Err(JobsiteError::BadInput(format!(
                "End date {end} is before start date {start}"
            )));
        }
    }
    Ok(ProjectInput {
        name,
        project_number: non_blank(input.project_number.as_ref()),
        address: non_blank(input.address.as_ref()),
        city: non_blank(input.city.as_ref()),
        ..input.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::project_repository::MockProjectRepository;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::{MembershipTier, ProjectStatus};
    use chrono::{NaiveDate, Utc};

    const ADMIN: Principal = Principal::Admin {
        admin_id: 1,
        company_id: 10,
    };

    fn project(id: i64, name: &str) -> Project {
        Project {
            id,
            company_id: 10,
            name: name.to_string(),
            project_number: None,
            address: None,
            city: None,
            status: ProjectStatus::Active,
            start_date: None,
            end_date: None,
            created_at: Utc::now(),
        }
    }

    fn input(name: &str) -> ProjectInput {
        ProjectInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_stores_trimmed_name() -> Result<(), JobsiteError> {
        let mut project_repo = MockProjectRepository::new();
        project_repo.expect_find_by_name().returning(|_, _| Ok(None));
        project_repo
            .expect_insert()
            .withf(|company_id, input| *company_id == 10 && input.name == "Big One")
            .returning(|_, input| Ok(project(99, &input.name)));

        let service = ProjectService::new(Arc::new(project_repo));
        let created = service.create(&ADMIN, &input("  Big One "))?;
        assert_eq!(created.name, "Big One");
        Ok(())
    }

    #[test]
    fn test_create_beyond_tier_limit_is_refused() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let principal = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let service = ProjectService::new(db_manager.create_project_repository());
        for name in ["One", "Two", "Three"] {
            service.create(&principal, &input(name))?;
        }

        assert!(matches!(
            service.create(&principal, &input("Four")),
            Err(JobsiteError::ProjectLimitReached { limit: 3, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_duplicate_name_conflicts() {
        let mut project_repo = MockProjectRepository::new();
        project_repo
            .expect_find_by_name()
            .returning(|_, name| Ok(Some(project(5, name))));

        let service = ProjectService::new(Arc::new(project_repo));
        assert!(matches!(
            service.create(&ADMIN, &input("Bridge")),
            Err(JobsiteError::Conflict(_))
        ));
        // Renaming another project to a taken name conflicts too
        assert!(matches!(
            service.update(&ADMIN, 6, &input("Bridge")),
            Err(JobsiteError::Conflict(_))
        ));
    }

    #[test]
    fn test_validation() {
        let service = ProjectService::new(Arc::new(MockProjectRepository::new()));
        assert!(matches!(
            service.create(&ADMIN, &input("   ")),
            Err(JobsiteError::BadInput(_))
        ));

        let backwards = ProjectInput {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..input("Bridge")
        };
        assert!(matches!(
            service.create(&ADMIN, &backwards),
            Err(JobsiteError::BadInput(_))
        ));

        let contractor = Principal::Contractor {
            contractor_id: 1,
            company_id: 10,
        };
        assert!(matches!(
            service.create(&contractor, &input("Bridge")),
            Err(JobsiteError::Forbidden(_))
        ));
    }

    #[test]
    fn test_delete_with_timesheets_conflicts() {
        let mut project_repo = MockProjectRepository::new();
        project_repo
            .expect_find_by_id()
            .returning(|_, id| Ok(Some(project(id, "Bridge"))));
        project_repo.expect_delete().returning(|_, _| {
            Err(JobsiteError::Conflict(
                "The project has timesheets and can not be deleted".to_string(),
            ))
        });

        let service = ProjectService::new(Arc::new(project_repo));
        assert!(matches!(
            service.delete(&ADMIN, 5),
            Err(JobsiteError::Conflict(_))
        ));
    }
}
