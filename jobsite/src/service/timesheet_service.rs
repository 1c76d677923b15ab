//! Timesheets: contractors record hours against projects, admins review them.
//!
//! A timesheet starts out `pending` and is either approved or rejected once.
//! Only the owning contractor may edit it, and only while it is pending.
use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::pagination::{PageRequest, Paginated};
use crate::repository::contractor_repository::ContractorRepository;
use crate::repository::project_repository::ProjectRepository;
use crate::repository::timesheet_repository::{
    TimesheetFilter, TimesheetRepository, TimesheetReview,
};
use crate::types::{non_blank, Timesheet, TimesheetInput, TimesheetStatus, TimesheetStatusSummary};
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::sync::Arc;

pub const MAX_HOURS_PER_DAY: f64 = 24.0;

/// Body of the review request
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StatusChange {
    pub status: TimesheetStatus,
    pub reason: Option<String>,
}

pub struct TimesheetService {
    timesheet_repo: Arc<dyn TimesheetRepository>,
    project_repo: Arc<dyn ProjectRepository>,
    contractor_repo: Arc<dyn ContractorRepository>,
}

impl TimesheetService {
    pub fn new(
        timesheet_repo: Arc<dyn TimesheetRepository>,
        project_repo: Arc<dyn ProjectRepository>,
        contractor_repo: Arc<dyn ContractorRepository>,
    ) -> Self {
        Self {
            timesheet_repo,
            project_repo,
            contractor_repo,
        }
    }

    /// Admins list the whole company, contractors only their own timesheets
    ///
    /// # Errors
    /// `BadInput` when `date_to` is before `date_from`
    pub fn list(
        &self,
        principal: &Principal,
        filter: &TimesheetFilter,
        page: &PageRequest,
    ) -> Result<Paginated<Timesheet>, JobsiteError> {
        check_range(filter.date_from, filter.date_to)?;
        let mut filter = filter.clone();
        if let Some(own_id) = principal.contractor_id() {
            filter.contractor_id = Some(own_id);
        }
        let (rows, total) = self
            .timesheet_repo
            .list(principal.company_id(), &filter, page)?;
        Ok(Paginated::new(rows, total, page))
    }

    /// Records hours. Contractors record their own, admins must name the contractor.
    ///
    /// # Errors
    /// `BadInput` for invalid hours or a missing contractor id, `NotFound` for an
    /// unknown project or contractor
    pub fn create(
        &self,
        principal: &Principal,
        input: &TimesheetInput,
    ) -> Result<Timesheet, JobsiteError> {
        let company_id = principal.company_id();
        let input = self.validated(company_id, input)?;
        let contractor_id = match principal {
            Principal::Contractor { contractor_id, .. } => *contractor_id,
            Principal::Admin { .. } => {
                let contractor_id = input.contractor_id.ok_or_else(|| {
                    JobsiteError::BadInput("contractorId is required".to_string())
                })?;
                let contractor = self
                    .contractor_repo
                    .find_by_id(company_id, contractor_id)?
                    .ok_or_else(|| JobsiteError::not_found("Contractor", contractor_id))?;
                if !contractor.active {
                    return Err(JobsiteError::BadInput(format!(
                        "Contractor {contractor_id} is not active"
                    )));
                }
                contractor_id
            }
        };
        let timesheet = self.timesheet_repo.insert(company_id, contractor_id, &input)?;
        debug!(
            "Contractor {contractor_id} logged {} hours on {}",
            timesheet.hours, timesheet.work_date
        );
        Ok(timesheet)
    }

    /// # Errors
    /// `NotFound` if the timesheet is not visible to the caller
    pub fn get(&self, principal: &Principal, id: i64) -> Result<Timesheet, JobsiteError> {
        let timesheet = self
            .timesheet_repo
            .find_by_id(principal.company_id(), id)?
            .ok_or_else(|| JobsiteError::not_found("Timesheet", id))?;
        match principal.contractor_id() {
            Some(own_id) if own_id != timesheet.contractor_id => {
                Err(JobsiteError::not_found("Timesheet", id))
            }
            _ => Ok(timesheet),
        }
    }

    /// The owning contractor edits a pending timesheet
    ///
    /// # Errors
    /// `Forbidden` for admins, `NotFound` for foreign timesheets and `Conflict`
    /// once the timesheet has been reviewed
    pub fn update(
        &self,
        principal: &Principal,
        id: i64,
        input: &TimesheetInput,
    ) -> Result<Timesheet, JobsiteError> {
        if principal.is_admin() {
            return Err(JobsiteError::Forbidden(
                "Only the contractor who recorded a timesheet can edit it".to_string(),
            ));
        }
        let current = self.get(principal, id)?;
        require_pending(&current)?;
        let input = self.validated(principal.company_id(), input)?;
        // The row may have been reviewed in the meantime
        self.timesheet_repo
            .update(principal.company_id(), id, &input)?
            .ok_or_else(not_pending)
    }

    /// Admins delete any timesheet, contractors their own while it is pending
    ///
    /// # Errors
    /// `NotFound` or `Conflict`
    pub fn delete(&self, principal: &Principal, id: i64) -> Result<(), JobsiteError> {
        let current = self.get(principal, id)?;
        if !principal.is_admin() {
            require_pending(&current)?;
        }
        if self.timesheet_repo.delete(principal.company_id(), id)? {
            Ok(())
        } else {
            Err(JobsiteError::not_found("Timesheet", id))
        }
    }

    /// Approves or rejects a pending timesheet
    ///
    /// # Errors
    /// `InvalidTransition` unless moving from pending to approved or rejected,
    /// `BadInput` for a rejection without reason
    pub fn review(
        &self,
        principal: &Principal,
        id: i64,
        change: &StatusChange,
    ) -> Result<Timesheet, JobsiteError> {
        let admin_id = principal.require_admin()?;
        let current = self.get(principal, id)?;
        if !current.status.can_transition_to(change.status) {
            return Err(JobsiteError::InvalidTransition {
                from: current.status.to_string(),
                to: change.status.to_string(),
            });
        }
        let rejection_reason = match change.status {
            TimesheetStatus::Rejected => Some(non_blank(change.reason.as_ref()).ok_or_else(|| {
                JobsiteError::BadInput("A reason is required to reject a timesheet".to_string())
            })?),
            _ => None,
        };
        let review = TimesheetReview {
            status: change.status,
            rejection_reason,
            reviewed_by: admin_id,
            reviewed_at: Utc::now(),
        };
        let reviewed = self
            .timesheet_repo
            .review(principal.company_id(), id, current.status, &review)?
            .ok_or_else(|| {
                JobsiteError::Conflict(format!("Timesheet {id} was changed by someone else"))
            })?;
        info!("Admin {admin_id} {} timesheet {id}", reviewed.status);
        Ok(reviewed)
    }

    /// Count and hours per status
    ///
    /// # Errors
    /// `Forbidden` for contractors, `BadInput` for a reversed range
    pub fn summary(
        &self,
        principal: &Principal,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TimesheetStatusSummary>, JobsiteError> {
        principal.require_admin()?;
        check_range(from, to)?;
        self.timesheet_repo.summary(principal.company_id(), from, to)
    }

    fn validated(&self, company_id: i64, input: &TimesheetInput) -> Result<TimesheetInput, JobsiteError> {
        if !input.hours.is_finite() || input.hours <= 0.0 || input.hours > MAX_HOURS_PER_DAY {
            return Err(JobsiteError::BadInput(format!(
                "Hours must be more than 0 and at most {MAX_HOURS_PER_DAY}"
            )));
        }
        if self
            .project_repo
            .find_by_id(company_id, input.project_id)?
            .is_none()
        {
            return Err(JobsiteError::not_found("Project", input.project_id));
        }
        Ok(TimesheetInput {
            description: non_blank(input.description.as_ref()),
            ..input.clone()
        })
    }
}

fn not_pending() -> JobsiteError {
    JobsiteError::Conflict("Only pending timesheets can be changed".to_string())
}

fn require_pending(timesheet: &Timesheet) -> Result<(), JobsiteError> {
    if timesheet.status == TimesheetStatus::Pending {
        Ok(())
    } else {
        Err(not_pending())
    }
}

fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), JobsiteError> {
    match (from, to) {
        (Some(from), Some(to)) if to < from => Err(JobsiteError::BadInput(format!(
            "dateTo {to} is before dateFrom {from}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::database_manager::DatabaseManager;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::{ContractorInput, MembershipTier, ProjectInput};

    struct Fixture {
        service: TimesheetService,
        admin: Principal,
        ada: Principal,
        alan: Principal,
        project_id: i64,
    }

    fn fixture() -> Result<Fixture, JobsiteError> {
        let db_manager: DatabaseManager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let project = db_manager.create_project_repository().insert(
            company.id,
            &ProjectInput {
                name: "Bridge".to_string(),
                ..Default::default()
            },
        )?;
        let contractors = db_manager.create_contractor_repository();
        let mut ids = Vec::new();
        for email in ["ada@crew.example", "alan@crew.example"] {
            ids.push(
                contractors
                    .insert(
                        company.id,
                        &ContractorInput {
                            first_name: "Crew".to_string(),
                            last_name: "Member".to_string(),
                            email: email.to_string(),
                            hourly_rate_cents: 3_500,
                            ..Default::default()
                        },
                    )?
                    .id,
            );
        }
        Ok(Fixture {
            service: TimesheetService::new(
                db_manager.create_timesheet_repository(),
                db_manager.create_project_repository(),
                contractors,
            ),
            admin: Principal::Admin {
                admin_id: admin.id,
                company_id: company.id,
            },
            ada: Principal::Contractor {
                contractor_id: ids[0],
                company_id: company.id,
            },
            alan: Principal::Contractor {
                contractor_id: ids[1],
                company_id: company.id,
            },
            project_id: project.id,
        })
    }

    fn entry(project_id: i64, hours: f64) -> TimesheetInput {
        TimesheetInput {
            project_id,
            work_date: NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid date"),
            hours,
            description: Some("Formwork".to_string()),
            contractor_id: None,
        }
    }

    #[test]
    fn test_hours_bounds() -> Result<(), JobsiteError> {
        let f = fixture()?;
        for hours in [0.0, -1.0, 24.5, f64::NAN] {
            assert!(matches!(
                f.service.create(&f.ada, &entry(f.project_id, hours)),
                Err(JobsiteError::BadInput(_))
            ));
        }
        f.service.create(&f.ada, &entry(f.project_id, 24.0))?;
        assert!(matches!(
            f.service.create(&f.ada, &entry(999, 8.0)),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_admin_must_name_contractor() -> Result<(), JobsiteError> {
        let f = fixture()?;
        assert!(matches!(
            f.service.create(&f.admin, &entry(f.project_id, 8.0)),
            Err(JobsiteError::BadInput(_))
        ));
        let on_behalf = TimesheetInput {
            contractor_id: f.alan.contractor_id(),
            ..entry(f.project_id, 8.0)
        };
        let sheet = f.service.create(&f.admin, &on_behalf)?;
        assert_eq!(Some(sheet.contractor_id), f.alan.contractor_id());
        Ok(())
    }

    #[test]
    fn test_contractors_only_see_their_own() -> Result<(), JobsiteError> {
        let f = fixture()?;
        let mine = f.service.create(&f.ada, &entry(f.project_id, 8.0))?;
        f.service.create(&f.alan, &entry(f.project_id, 6.0))?;

        let filter = TimesheetFilter {
            contractor_id: f.alan.contractor_id(),
            ..Default::default()
        };
        let page = f.service.list(&f.ada, &filter, &PageRequest::default())?;
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.items[0].id, mine.id);

        let page = f.service.list(&f.admin, &TimesheetFilter::default(), &PageRequest::default())?;
        assert_eq!(page.pagination.total, 2);

        assert!(matches!(
            f.service.get(&f.alan, mine.id),
            Err(JobsiteError::NotFound { .. })
        ));
        assert!(matches!(
            f.service.delete(&f.alan, mine.id),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_review_workflow() -> Result<(), JobsiteError> {
        let f = fixture()?;
        let sheet = f.service.create(&f.ada, &entry(f.project_id, 8.0))?;

        let reject_without_reason = StatusChange {
            status: TimesheetStatus::Rejected,
            reason: Some("  ".to_string()),
        };
        assert!(matches!(
            f.service.review(&f.admin, sheet.id, &reject_without_reason),
            Err(JobsiteError::BadInput(_))
        ));
        let approve = StatusChange {
            status: TimesheetStatus::Approved,
            reason: None,
        };
        assert!(matches!(
            f.service.review(&f.ada, sheet.id, &approve),
            Err(JobsiteError::Forbidden(_))
        ));

        let approved = f.service.review(&f.admin, sheet.id, &approve)?;
        assert_eq!(approved.status, TimesheetStatus::Approved);
        assert_eq!(approved.reviewed_by, match f.admin {
            Principal::Admin { admin_id, .. } => Some(admin_id),
            Principal::Contractor { .. } => None,
        });

        let reject = StatusChange {
            status: TimesheetStatus::Rejected,
            reason: Some("Wrong project".to_string()),
        };
        assert!(matches!(
            f.service.review(&f.admin, sheet.id, &reject),
            Err(JobsiteError::InvalidTransition { .. })
        ));
        assert!(matches!(
            f.service.update(&f.ada, sheet.id, &entry(f.project_id, 4.0)),
            Err(JobsiteError::Conflict(_))
        ));
        assert!(matches!(
            f.service.delete(&f.ada, sheet.id),
            Err(JobsiteError::Conflict(_))
        ));
        f.service.delete(&f.admin, sheet.id)?;
        Ok(())
    }

    #[test]
    fn test_owner_edits_pending() -> Result<(), JobsiteError> {
        let f = fixture()?;
        let sheet = f.service.create(&f.ada, &entry(f.project_id, 8.0))?;
        let updated = f.service.update(&f.ada, sheet.id, &entry(f.project_id, 7.5))?;
        assert_eq!(updated.hours, 7.5);
        assert!(matches!(
            f.service.update(&f.admin, sheet.id, &entry(f.project_id, 7.5)),
            Err(JobsiteError::Forbidden(_))
        ));

        let summary = f.service.summary(&f.admin, None, None)?;
        assert_eq!(summary[0].count, 1);
        Ok(())
    }
}
