use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::pagination::{PageRequest, Paginated};
use crate::repository::document_repository::{DocumentRepository, NewDocument};
use crate::repository::project_repository::ProjectRepository;
use crate::service::required_text;
use crate::types::{non_blank, DocumentInput, ProjectDocument};
use log::info;
use std::sync::Arc;
use url::Url;

pub const DEFAULT_CATEGORY: &str = "general";

/// Metadata of the files attached to a project
pub struct DocumentService {
    document_repo: Arc<dyn DocumentRepository>,
    project_repo: Arc<dyn ProjectRepository>,
}

impl DocumentService {
    pub fn new(
        document_repo: Arc<dyn DocumentRepository>,
        project_repo: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            document_repo,
            project_repo,
        }
    }

    /// # Errors
    /// Returns `NotFound` if the project is not in the caller's company
    pub fn list(
        &self,
        principal: &Principal,
        project_id: i64,
        category: Option<&str>,
        page: &PageRequest,
    ) -> Result<Paginated<ProjectDocument>, JobsiteError> {
        self.require_project(principal.company_id(), project_id)?;
        let (rows, total) =
            self.document_repo
                .list(principal.company_id(), project_id, category, page)?;
        Ok(Paginated::new(rows, total, page))
    }

    /// Registers a document, usually one just stored through the upload endpoint
    ///
    /// # Errors
    /// `Forbidden`, `NotFound` for an unknown project, `BadInput` or `InvalidUrl`
    pub fn create(
        &self,
        principal: &Principal,
        project_id: i64,
        input: &DocumentInput,
    ) -> Result<ProjectDocument, JobsiteError> {
        let admin_id = principal.require_admin()?;
        self.require_project(principal.company_id(), project_id)?;

        let name = required_text(&input.name, "Document name")?;
        let url = Url::parse(required_text(&input.url, "Document url")?.as_str())?;
        if input.size.is_some_and(|size| size < 0) {
            return Err(JobsiteError::BadInput(
                "Document size can not be negative".to_string(),
            ));
        }
        let document = self.document_repo.insert(
            principal.company_id(),
            &NewDocument {
                project_id,
                name,
                category: non_blank(input.category.as_ref())
                    .map_or_else(|| DEFAULT_CATEGORY.to_string(), |c| c.to_lowercase()),
                url: url.to_string(),
                content_type: non_blank(input.content_type.as_ref()),
                size_bytes: input.size,
                uploaded_by: admin_id,
            },
        )?;
        info!("Added document {} to project {project_id}", document.id);
        Ok(document)
    }

    /// Removes the document row and returns it, the caller disposes of the stored file
    ///
    /// # Errors
    /// Returns `Forbidden` for contractors and `NotFound` for unknown documents
    pub fn delete(
        &self,
        principal: &Principal,
        project_id: i64,
        document_id: i64,
    ) -> Result<ProjectDocument, JobsiteError> {
        principal.require_admin()?;
        let company_id = principal.company_id();
        let document = self
            .document_repo
            .find_by_id(company_id, project_id, document_id)?
            .ok_or_else(|| JobsiteError::not_found("Document", document_id))?;
        if self.document_repo.delete(company_id, project_id, document_id)? {
            Ok(document)
        } else {
            Err(JobsiteError::not_found("Document", document_id))
        }
    }

    fn require_project(&self, company_id: i64, project_id: i64) -> Result<(), JobsiteError> {
        self.project_repo
            .find_by_id(company_id, project_id)?
            .map(|_| ())
            .ok_or_else(|| JobsiteError::not_found("Project", project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::{MembershipTier, ProjectInput};

    fn input(url: &str) -> DocumentInput {
        DocumentInput {
            name: "Site plan".to_string(),
            category: None,
            url: url.to_string(),
            content_type: Some("application/pdf".to_string()),
            size: Some(2048),
        }
    }

    #[test]
    fn test_create_and_delete() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let admin = Principal::Admin {
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
        let service = DocumentService::new(
            db_manager.create_document_repository(),
            db_manager.create_project_repository(),
        );

        let document = service.create(&admin, project.id, &input("https://files.example/plan.pdf"))?;
        assert_eq!(document.category, DEFAULT_CATEGORY);
        assert_eq!(document.uploaded_by, admin.require_admin()?);

        assert!(matches!(
            service.create(&admin, project.id, &input("not a url")),
            Err(JobsiteError::InvalidUrl(_))
        ));
        assert!(matches!(
            service.create(&admin, 999, &input("https://files.example/plan.pdf")),
            Err(JobsiteError::NotFound { .. })
        ));

        let contractor = Principal::Contractor {
            contractor_id: 1,
            company_id: company.id,
        };
        let listed = service.list(&contractor, project.id, None, &PageRequest::default())?;
        assert_eq!(listed.items.len(), 1);
        assert!(matches!(
            service.delete(&contractor, project.id, document.id),
            Err(JobsiteError::Forbidden(_))
        ));

        let deleted = service.delete(&admin, project.id, document.id)?;
        assert_eq!(deleted.url, document.url);
        assert!(matches!(
            service.delete(&admin, project.id, document.id),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }
}
