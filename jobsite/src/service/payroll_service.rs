use crate::auth::Principal;
use crate::date::{split_into_weeks, weeks_spanned, MAX_WEEKS};
use crate::error::JobsiteError;
use crate::payroll::{build_report, CertifiedPayrollReport, PayrollRequest};
use crate::repository::contractor_repository::ContractorRepository;
use crate::repository::project_repository::ProjectRepository;
use crate::repository::subcontractor_repository::SubcontractorRepository;
use crate::repository::timesheet_repository::TimesheetRepository;
use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub struct PayrollService {
    project_repo: Arc<dyn ProjectRepository>,
    timesheet_repo: Arc<dyn TimesheetRepository>,
    contractor_repo: Arc<dyn ContractorRepository>,
    subcontractor_repo: Arc<dyn SubcontractorRepository>,
}

impl PayrollService {
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        timesheet_repo: Arc<dyn TimesheetRepository>,
        contractor_repo: Arc<dyn ContractorRepository>,
        subcontractor_repo: Arc<dyn SubcontractorRepository>,
    ) -> Self {
        Self {
            project_repo,
            timesheet_repo,
            contractor_repo,
            subcontractor_repo,
        }
    }

    /// Certified payroll of one project over a range of weeks, based on the
    /// approved timesheets only
    ///
    /// # Errors
    /// `Forbidden` for contractors, `BadInput` for a reversed range or one
    /// spanning more than `MAX_WEEKS` weeks, `NotFound` for an unknown project
    pub fn calculate_multi_week(
        &self,
        principal: &Principal,
        request: &PayrollRequest,
    ) -> Result<CertifiedPayrollReport, JobsiteError> {
        principal.require_admin()?;
        let company_id = principal.company_id();
        let weeks = split_into_weeks(request.start_date, request.end_date)?;
        let spanned = weeks_spanned(request.start_date, request.end_date);
        if usize::try_from(spanned).map_or(true, |n| n > MAX_WEEKS) {
            return Err(JobsiteError::BadInput(format!(
                "The date range spans {spanned} weeks, at most {MAX_WEEKS} are allowed"
            )));
        }

        let project = self
            .project_repo
            .find_by_id(company_id, request.project_id)?
            .ok_or_else(|| JobsiteError::not_found("Project", request.project_id))?;

        let timesheets = self.timesheet_repo.find_approved_for_project(
            company_id,
            project.id,
            request.start_date,
            request.end_date,
        )?;
        let contractor_ids: Vec<i64> = timesheets
            .iter()
            .map(|t| t.contractor_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let contractors: HashMap<_, _> = self
            .contractor_repo
            .find_by_ids(company_id, &contractor_ids)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut subcontractor_names = HashMap::new();
        for subcontractor_id in contractors.values().filter_map(|c| c.subcontractor_id) {
            if subcontractor_names.contains_key(&subcontractor_id) {
                continue;
            }
            if let Some(sub) = self.subcontractor_repo.find_by_id(company_id, subcontractor_id)? {
                subcontractor_names.insert(subcontractor_id, sub.name);
            }
        }

        debug!(
            "Payroll for project {}: {} weeks, {} approved timesheets, {} workers",
            project.id,
            weeks.len(),
            timesheets.len(),
            contractors.len()
        );
        Ok(build_report(
            &project,
            &weeks,
            &timesheets,
            &contractors,
            &subcontractor_names,
        ))
    }
}
