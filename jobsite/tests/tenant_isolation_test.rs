#[allow(dead_code)]
mod test_helpers;

use crate::test_helpers::common::TestContext;
use crate::test_helpers::fixtures::{contractor_input, project_input, timesheet_input};
use jobsite::auth::Principal;
use jobsite::error::JobsiteError;
use jobsite::pagination::PageRequest;
use jobsite::repository::project_repository::ProjectFilter;
use jobsite::repository::submission_repository::SubmissionFilter;
use jobsite::service::contractor_service::ContractorRemoval;
use jobsite::types::{MembershipTier, SubmissionInput, SubmissionType};
use serde_json::json;

#[test]
fn test_companies_do_not_see_each_other() -> Result<(), JobsiteError> {
    let ctx = TestContext::new()?;
    let acme = ctx.create_company("Acme", MembershipTier::Basic)?;
    let globex = ctx.create_company("Globex", MembershipTier::Basic)?;
    let rt = &ctx.runtime;

    let project = rt.project_service().create(&acme, &project_input("Bridge"))?;
    let contractor = rt
        .contractor_service()
        .create(&acme, &contractor_input("ada@crew.example", "Springfield", 4000))?;

    assert!(matches!(
        rt.project_service().get(&globex, project.id),
        Err(JobsiteError::NotFound { .. })
    ));
    assert!(matches!(
        rt.contractor_service().get(&globex, contractor.id),
        Err(JobsiteError::NotFound { .. })
    ));
    let page = rt
        .project_service()
        .list(&globex, &ProjectFilter::default(), &PageRequest::default())?;
    assert_eq!(page.pagination.total, 0);

    // Names only need to be unique within a company
    rt.project_service().create(&globex, &project_input("Bridge"))?;

    let mut on_foreign_project = timesheet_input(project.id, "2024-03-04", 8.0);
    on_foreign_project.contractor_id = Some(contractor.id);
    assert!(matches!(
        rt.timesheet_service().create(&globex, &on_foreign_project),
        Err(JobsiteError::NotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_contractors_only_see_their_own_submissions() -> Result<(), JobsiteError> {
    let ctx = TestContext::new()?;
    let admin = ctx.create_company("Acme", MembershipTier::Professional)?;
    let rt = &ctx.runtime;
    let company_id = admin.company_id();

    let ada = rt
        .contractor_service()
        .create(&admin, &contractor_input("ada@crew.example", "Springfield", 4000))?;
    let alan = rt
        .contractor_service()
        .create(&admin, &contractor_input("alan@crew.example", "Springfield", 4000))?;
    let as_ada = Principal::Contractor {
        contractor_id: ada.id,
        company_id,
    };
    let as_alan = Principal::Contractor {
        contractor_id: alan.id,
        company_id,
    };

    let incident = rt.submission_service().create(
        &as_ada,
        &SubmissionInput {
            submission_type: SubmissionType::IncidentReport,
            project_id: None,
            form_data: json!({ "incidentDate": "2024-03-04", "description": "Slipped on ice" }),
        },
    )?;

    let own = rt
        .submission_service()
        .list(&as_ada, &SubmissionFilter::default(), &PageRequest::default())?;
    assert_eq!(own.items.len(), 1);
    let others = rt
        .submission_service()
        .list(&as_alan, &SubmissionFilter::default(), &PageRequest::default())?;
    assert!(others.items.is_empty());
    assert!(matches!(
        rt.submission_service().delete(&as_alan, incident.id),
        Err(JobsiteError::NotFound { .. })
    ));

    let everything = rt
        .submission_service()
        .list(&admin, &SubmissionFilter::default(), &PageRequest::default())?;
    assert_eq!(everything.pagination.total, 1);
    Ok(())
}

#[test]
fn test_contractor_with_timesheets_is_deactivated() -> Result<(), JobsiteError> {
    let ctx = TestContext::new()?;
    let admin = ctx.create_company("Acme", MembershipTier::Basic)?;
    let rt = &ctx.runtime;

    let project = rt.project_service().create(&admin, &project_input("Bridge"))?;
    let busy = rt
        .contractor_service()
        .create(&admin, &contractor_input("busy@crew.example", "Springfield", 4000))?;
    let idle = rt
        .contractor_service()
        .create(&admin, &contractor_input("idle@crew.example", "Springfield", 4000))?;

    let mut input = timesheet_input(project.id, "2024-03-04", 8.0);
    input.contractor_id = Some(busy.id);
    rt.timesheet_service().create(&admin, &input)?;

    assert_eq!(
        rt.contractor_service().delete(&admin, busy.id)?,
        ContractorRemoval::Deactivated
    );
    assert!(!rt.contractor_service().get(&admin, busy.id)?.active);
    assert_eq!(
        rt.contractor_service().delete(&admin, idle.id)?,
        ContractorRemoval::Deleted
    );
    assert!(matches!(
        rt.contractor_service().get(&admin, idle.id),
        Err(JobsiteError::NotFound { .. })
    ));

    // Inactive contractors can not be given new hours
    assert!(matches!(
        rt.timesheet_service().create(&admin, &input),
        Err(JobsiteError::BadInput(_))
    ));
    Ok(())
}
