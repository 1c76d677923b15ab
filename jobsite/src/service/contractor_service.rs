use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::pagination::{PageRequest, Paginated};
use crate::repository::contractor_repository::{ContractorFilter, ContractorRepository};
use crate::repository::subcontractor_repository::SubcontractorRepository;
use crate::service::required_text;
use crate::types::{non_blank, Contractor, ContractorInput};
use log::info;
use serde::Serialize;
use std::sync::Arc;

/// Upper bound of the hourly and fringe rates, $10,000 an hour
pub const MAX_RATE_CENTS: i64 = 1_000_000;

/// What became of a contractor on delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractorRemoval {
    Deleted,
    /// The contractor has timesheets and was only deactivated
    Deactivated,
}

pub struct ContractorService {
    contractor_repo: Arc<dyn ContractorRepository>,
    subcontractor_repo: Arc<dyn SubcontractorRepository>,
}

impl ContractorService {
    pub fn new(
        contractor_repo: Arc<dyn ContractorRepository>,
        subcontractor_repo: Arc<dyn SubcontractorRepository>,
    ) -> Self {
        Self {
            contractor_repo,
            subcontractor_repo,
        }
    }

    /// # Errors
    /// Returns `Forbidden` for contractors
    pub fn list(
        &self,
        principal: &Principal,
        filter: &ContractorFilter,
        page: &PageRequest,
    ) -> Result<Paginated<Contractor>, JobsiteError> {
        principal.require_admin()?;
        let (rows, total) = self
            .contractor_repo
            .list(principal.company_id(), filter, page)?;
        Ok(Paginated::new(rows, total, page))
    }

    /// # Errors
    /// `BadInput` for invalid fields, `Conflict` when the email is taken
    pub fn create(
        &self,
        principal: &Principal,
        input: &ContractorInput,
    ) -> Result<Contractor, JobsiteError> {
        principal.require_admin()?;
        let input = self.validated(principal.company_id(), None, input)?;
        let contractor = self.contractor_repo.insert(principal.company_id(), &input)?;
        info!("Created contractor {} ({})", contractor.id, contractor.email);
        Ok(contractor)
    }

    /// Admins see every contractor of the company, a contractor only itself
    ///
    /// # Errors
    /// Returns `NotFound` otherwise
    pub fn get(&self, principal: &Principal, id: i64) -> Result<Contractor, JobsiteError> {
        if let Some(own_id) = principal.contractor_id() {
            if own_id != id {
                return Err(JobsiteError::not_found("Contractor", id));
            }
        }
        self.contractor_repo
            .find_by_id(principal.company_id(), id)?
            .ok_or_else(|| JobsiteError::not_found("Contractor", id))
    }

    /// # Errors
    /// `NotFound`, `BadInput` or `Conflict`
    pub fn update(
        &self,
        principal: &Principal,
        id: i64,
        input: &ContractorInput,
    ) -> Result<Contractor, JobsiteError> {
        principal.require_admin()?;
        let input = self.validated(principal.company_id(), Some(id), input)?;
        self.contractor_repo
            .update(principal.company_id(), id, &input)?
            .ok_or_else(|| JobsiteError::not_found("Contractor", id))
    }

    /// Deletes the contractor, or deactivates it when timesheets refer to it
    ///
    /// # Errors
    /// Returns `NotFound` if there is no such contractor
    pub fn delete(&self, principal: &Principal, id: i64) -> Result<ContractorRemoval, JobsiteError> {
        principal.require_admin()?;
        let company_id = principal.company_id();
        self.get(principal, id)?;
        if self.contractor_repo.has_timesheets(company_id, id)? {
            self.contractor_repo.deactivate(company_id, id)?;
            info!("Contractor {id} has timesheets and was deactivated");
            return Ok(ContractorRemoval::Deactivated);
        }
        if self.contractor_repo.delete(company_id, id)? {
            Ok(ContractorRemoval::Deleted)
        } else {
            Err(JobsiteError::not_found("Contractor", id))
        }
    }

    fn validated(
        &self,
        company_id: i64,
        id: Option<i64>,
        input: &ContractorInput,
    ) -> Result<ContractorInput, JobsiteError> {
        let first_name = required_text(&input.first_name, "First name")?;
        let last_name = required_text(&input.last_name, "Last name")?;
        let email = required_text(&input.email, "Email")?.to_lowercase();
        if !email.contains('@') {
            return Err(JobsiteError::BadInput(format!(
                "'{email}' is not an email address"
            )));
        }
        for (rate, field) in [
            (input.hourly_rate_cents, "hourlyRateCents"),
            (input.fringe_rate_cents, "fringeRateCents"),
        ] {
            if !(0..=MAX_RATE_CENTS).contains(&rate) {
                return Err(JobsiteError::BadInput(format!(
                    "{field} must be between 0 and {MAX_RATE_CENTS}"
                )));
            }
        }
        if let Some(subcontractor_id) = input.subcontractor_id {
            if self
                .subcontractor_repo
                .find_by_id(company_id, subcontractor_id)?
                .is_none()
            {
                return Err(JobsiteError::not_found("Subcontractor", subcontractor_id));
            }
        }
        if let Some(existing) = self.contractor_repo.find_by_email(company_id, &email)? {
            if Some(existing.id) != id {
                return Err(JobsiteError::Conflict(format!(
                    "A contractor with email {email} already exists"
                )));
            }
        }
        Ok(ContractorInput {
            first_name,
            last_name,
            email,
            trade: non_blank(input.trade.as_ref()),
            city: non_blank(input.city.as_ref()),
            ..input.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::database_manager::DatabaseManager;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::repository::timesheet_repository::TimesheetRepository;
    use crate::repository::project_repository::ProjectRepository;
    use crate::types::{MembershipTier, ProjectInput, TimesheetInput};
    use chrono::NaiveDate;

    fn service(db_manager: &DatabaseManager) -> ContractorService {
        ContractorService::new(
            db_manager.create_contractor_repository(),
            db_manager.create_subcontractor_repository(),
        )
    }

    fn input(email: &str) -> ContractorInput {
        ContractorInput {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            hourly_rate_cents: 4_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_validates() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let principal = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let service = service(&db_manager);

        let ada = service.create(&principal, &input(" Ada@Crew.example "))?;
        assert_eq!(ada.email, "ada@crew.example");
        assert!(matches!(
            service.create(&principal, &input("ADA@crew.example")),
            Err(JobsiteError::Conflict(_))
        ));
        assert!(matches!(
            service.create(&principal, &input("not-an-email")),
            Err(JobsiteError::BadInput(_))
        ));
        let unknown_sub = ContractorInput {
            subcontractor_id: Some(999),
            ..input("x@crew.example")
        };
        assert!(matches!(
            service.create(&principal, &unknown_sub),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_rates_are_bounded() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let principal = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let service = service(&db_manager);

        for (hourly, fringe) in [(MAX_RATE_CENTS + 1, 0), (4_000, i64::MAX), (-1, 0)] {
            let rates = ContractorInput {
                hourly_rate_cents: hourly,
                fringe_rate_cents: fringe,
                ..input("rich@crew.example")
            };
            assert!(matches!(
                service.create(&principal, &rates),
                Err(JobsiteError::BadInput(_))
            ));
        }
        let at_limit = ContractorInput {
            hourly_rate_cents: MAX_RATE_CENTS,
            fringe_rate_cents: MAX_RATE_CENTS,
            ..input("rich@crew.example")
        };
        let rich = service.create(&principal, &at_limit)?;
        assert!(matches!(
            service.update(
                &principal,
                rich.id,
                &ContractorInput {
                    hourly_rate_cents: 4_000_000_000_000_000_000,
                    ..at_limit
                }
            ),
            Err(JobsiteError::BadInput(_))
        ));
        Ok(())
    }

    #[test]
    fn test_contractor_only_sees_itself() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let admin = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let service = service(&db_manager);
        let ada = service.create(&admin, &input("ada@crew.example"))?;
        let alan = service.create(&admin, &input("alan@crew.example"))?;

        let as_ada = Principal::Contractor {
            contractor_id: ada.id,
            company_id: company.id,
        };
        assert_eq!(service.get(&as_ada, ada.id)?.id, ada.id);
        assert!(matches!(
            service.get(&as_ada, alan.id),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_delete_deactivates_when_timesheets_exist() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let principal = Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        };
        let service = service(&db_manager);
        let ada = service.create(&principal, &input("ada@crew.example"))?;
        let alan = service.create(&principal, &input("alan@crew.example"))?;

        let project = db_manager.create_project_repository().insert(
            company.id,
            &ProjectInput {
                name: "Bridge".to_string(),
                ..Default::default()
            },
        )?;
        db_manager.create_timesheet_repository().insert(
            company.id,
            ada.id,
            &TimesheetInput {
                project_id: project.id,
                work_date: NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date"),
                hours: 8.0,
                description: None,
                contractor_id: None,
            },
        )?;

        assert_eq!(service.delete(&principal, ada.id)?, ContractorRemoval::Deactivated);
        assert!(!service.get(&principal, ada.id)?.active);
        assert_eq!(service.delete(&principal, alan.id)?, ContractorRemoval::Deleted);
        assert!(service.get(&principal, alan.id).is_err());
        Ok(())
    }
}
