use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::repository::company_repository::CompanyRepository;
use crate::repository::project_repository::ProjectRepository;
use crate::service::required_text;
use crate::types::{Admin, Company, CompanyOverview, MembershipTier};
use log::info;
use std::sync::Arc;

pub struct CompanyService {
    company_repo: Arc<dyn CompanyRepository>,
    project_repo: Arc<dyn ProjectRepository>,
}

impl CompanyService {
    pub fn new(
        company_repo: Arc<dyn CompanyRepository>,
        project_repo: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            company_repo,
            project_repo,
        }
    }

    /// The caller's company with its project limit and current project count
    ///
    /// # Errors
    /// Returns `Forbidden` for contractors and `NotFound` if the company is gone
    pub fn overview(&self, principal: &Principal) -> Result<CompanyOverview, JobsiteError> {
        principal.require_admin()?;
        let company_id = principal.company_id();
        let company = self
            .company_repo
            .find_company(company_id)?
            .ok_or_else(|| JobsiteError::not_found("Company", company_id))?;
        Ok(CompanyOverview {
            project_limit: company.tier.project_limit(),
            project_count: self.project_repo.count_for_company(company_id)?,
            company,
        })
    }

    /// Creates a company together with its first admin
    ///
    /// # Errors
    /// Returns `BadInput` for blank fields and `Conflict` if the admin email is taken
    pub fn bootstrap(
        &self,
        name: &str,
        tier: MembershipTier,
        admin_email: &str,
        admin_name: &str,
    ) -> Result<(Company, Admin), JobsiteError> {
        let name = required_text(name, "Company name")?;
        let admin_email = required_text(admin_email, "Admin email")?;
        let admin_name = required_text(admin_name, "Admin name")?;
        if !admin_email.contains('@') {
            return Err(JobsiteError::BadInput(format!(
                "'{admin_email}' is not an email address"
            )));
        }
        if self.company_repo.find_admin_by_email(&admin_email)?.is_some() {
            return Err(JobsiteError::Conflict(format!(
                "An admin with email {admin_email} already exists"
            )));
        }

        let company = self.company_repo.create_company(&name, tier)?;
        let admin = self
            .company_repo
            .create_admin(company.id, &admin_email, &admin_name)?;
        info!("Bootstrapped company {} '{}' with admin {}", company.id, company.name, admin.email);
        Ok((company, admin))
    }

    /// Moves a company to another membership tier. Existing projects are kept
    /// when the new tier allows fewer, only new ones are refused.
    ///
    /// # Errors
    /// Returns `NotFound` if the company does not exist
    pub fn change_tier(&self, company_id: i64, tier: MembershipTier) -> Result<(), JobsiteError> {
        if self.company_repo.update_tier(company_id, tier)? {
            info!("Company {company_id} moved to the {tier} tier");
            Ok(())
        } else {
            Err(JobsiteError::not_found("Company", company_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::company_repository::MockCompanyRepository;
    use crate::repository::project_repository::MockProjectRepository;
    use chrono::Utc;

    fn company(tier: MembershipTier) -> Company {
        Company {
            id: 4,
            name: "Acme".to_string(),
            tier,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_overview() -> Result<(), JobsiteError> {
        let mut company_repo = MockCompanyRepository::new();
        company_repo
            .expect_find_company()
            .returning(|_| Ok(Some(company(MembershipTier::Professional))));
        let mut project_repo = MockProjectRepository::new();
        project_repo.expect_count_for_company().returning(|_| Ok(7));

        let service = CompanyService::new(Arc::new(company_repo), Arc::new(project_repo));
        let overview = service.overview(&Principal::Admin {
            admin_id: 1,
            company_id: 4,
        })?;
        assert_eq!(overview.project_limit, Some(25));
        assert_eq!(overview.project_count, 7);

        let json = serde_json::to_value(&overview)?;
        assert_eq!(json["name"], "Acme");
        assert_eq!(json["projectLimit"], 25);
        Ok(())
    }

    #[test]
    fn test_overview_requires_admin() {
        let service = CompanyService::new(
            Arc::new(MockCompanyRepository::new()),
            Arc::new(MockProjectRepository::new()),
        );
        let result = service.overview(&Principal::Contractor {
            contractor_id: 1,
            company_id: 4,
        });
        assert!(matches!(result, Err(JobsiteError::Forbidden(_))));
    }

    #[test]
    fn test_bootstrap_rejects_taken_email() {
        let mut company_repo = MockCompanyRepository::new();
        company_repo.expect_find_admin_by_email().returning(|email| {
            Ok(Some(Admin {
                id: 1,
                company_id: 1,
                email: email.to_string(),
                name: "Boss".to_string(),
                created_at: Utc::now(),
            }))
        });
        let service = CompanyService::new(
            Arc::new(company_repo),
            Arc::new(MockProjectRepository::new()),
        );
        let result = service.bootstrap("Acme", MembershipTier::Basic, "boss@acme.example", "Boss");
        assert!(matches!(result, Err(JobsiteError::Conflict(_))));

        let result = service.bootstrap(" ", MembershipTier::Basic, "boss@acme.example", "Boss");
        assert!(matches!(result, Err(JobsiteError::BadInput(_))));
    }

    #[test]
    fn test_change_tier() -> Result<(), JobsiteError> {
        let mut company_repo = MockCompanyRepository::new();
        company_repo
            .expect_update_tier()
            .withf(|company_id, tier| *company_id == 4 && *tier == MembershipTier::Enterprise)
            .returning(|_, _| Ok(true));
        company_repo
            .expect_update_tier()
            .withf(|company_id, _| *company_id != 4)
            .returning(|_, _| Ok(false));

        let service = CompanyService::new(
            Arc::new(company_repo),
            Arc::new(MockProjectRepository::new()),
        );
        service.change_tier(4, MembershipTier::Enterprise)?;
        assert!(matches!(
            service.change_tier(99, MembershipTier::Basic),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }
}
