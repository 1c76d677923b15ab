//! Safety form submissions and the incident workflow on top of them.
use crate::auth::Principal;
use crate::error::JobsiteError;
use crate::pagination::{PageRequest, Paginated};
use crate::repository::project_repository::ProjectRepository;
use crate::repository::submission_repository::{
    NewSubmission, SubmissionFilter, SubmissionRepository,
};
use crate::types::{FieldShape, Submission, SubmissionInput, SubmissionStatus, SubmissionType};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

pub struct SubmissionService {
    submission_repo: Arc<dyn SubmissionRepository>,
    project_repo: Arc<dyn ProjectRepository>,
}

impl SubmissionService {
    pub fn new(
        submission_repo: Arc<dyn SubmissionRepository>,
        project_repo: Arc<dyn ProjectRepository>,
    ) -> Self {
        Self {
            submission_repo,
            project_repo,
        }
    }

    /// Admins list the company's submissions, contractors their own
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails
    pub fn list(
        &self,
        principal: &Principal,
        filter: &SubmissionFilter,
        page: &PageRequest,
    ) -> Result<Paginated<Submission>, JobsiteError> {
        let filter = SubmissionFilter {
            contractor_id: principal.contractor_id(),
            ..filter.clone()
        };
        let (rows, total) = self
            .submission_repo
            .list(principal.company_id(), &filter, page)?;
        Ok(Paginated::new(rows, total, page))
    }

    /// Stores a form after checking the fields required by its type
    ///
    /// # Errors
    /// `BadInput` for malformed form data, `NotFound` for an unknown project
    pub fn create(
        &self,
        principal: &Principal,
        input: &SubmissionInput,
    ) -> Result<Submission, JobsiteError> {
        validate_form(input.submission_type, &input.form_data)?;
        if let Some(project_id) = input.project_id {
            self.project_repo
                .find_by_id(principal.company_id(), project_id)?
                .ok_or_else(|| JobsiteError::not_found("Project", project_id))?;
        }
        let (contractor_id, admin_id) = match principal {
            Principal::Admin { admin_id, .. } => (None, Some(*admin_id)),
            Principal::Contractor { contractor_id, .. } => (Some(*contractor_id), None),
        };
        let submission = self.submission_repo.insert(
            principal.company_id(),
            &NewSubmission {
                contractor_id,
                admin_id,
                project_id: input.project_id,
                submission_type: input.submission_type,
                status: input.submission_type.initial_status(),
                form_data: input.form_data.clone(),
            },
        )?;
        debug!(
            "Stored {} submission {} for company {}",
            submission.submission_type,
            submission.id,
            submission.company_id
        );
        Ok(submission)
    }

    /// Contractors can only see their own submissions, anything else is not found
    ///
    /// # Errors
    /// Returns `NotFound`
    pub fn get(&self, principal: &Principal, id: i64) -> Result<Submission, JobsiteError> {
        let submission = self
            .submission_repo
            .find_by_id(principal.company_id(), id)?
            .ok_or_else(|| JobsiteError::not_found("Submission", id))?;
        match principal.contractor_id() {
            Some(own_id) if submission.contractor_id != Some(own_id) => {
                Err(JobsiteError::not_found("Submission", id))
            }
            _ => Ok(submission),
        }
    }

    /// # Errors
    /// Returns `NotFound` if the caller may not see the submission
    pub fn delete(&self, principal: &Principal, id: i64) -> Result<(), JobsiteError> {
        self.get(principal, id)?;
        if self.submission_repo.delete(principal.company_id(), id)? {
            info!("Deleted submission {id}");
            Ok(())
        } else {
            Err(JobsiteError::not_found("Submission", id))
        }
    }

    /// # Errors
    /// Returns `Forbidden` for contractors
    pub fn list_incidents(
        &self,
        principal: &Principal,
        status: Option<SubmissionStatus>,
        project_id: Option<i64>,
        page: &PageRequest,
    ) -> Result<Paginated<Submission>, JobsiteError> {
        principal.require_admin()?;
        let filter = SubmissionFilter {
            submission_type: Some(SubmissionType::IncidentReport),
            status,
            project_id,
            ..Default::default()
        };
        let (rows, total) = self
            .submission_repo
            .list(principal.company_id(), &filter, page)?;
        Ok(Paginated::new(rows, total, page))
    }

    /// # Errors
    /// Returns `NotFound` unless the id refers to a visible incident report
    pub fn get_incident(&self, principal: &Principal, id: i64) -> Result<Submission, JobsiteError> {
        let submission = self.get(principal, id)?;
        if submission.submission_type == SubmissionType::IncidentReport {
            Ok(submission)
        } else {
            Err(JobsiteError::not_found("Incident", id))
        }
    }

    /// Moves an incident along `open -> investigating -> closed`
    ///
    /// # Errors
    /// `Forbidden`, `NotFound` or `InvalidTransition`
    pub fn update_incident_status(
        &self,
        principal: &Principal,
        id: i64,
        status: SubmissionStatus,
    ) -> Result<Submission, JobsiteError> {
        principal.require_admin()?;
        let incident = self.get_incident(principal, id)?;
        if !incident.status.can_transition_to(status) {
            return Err(JobsiteError::InvalidTransition {
                from: incident.status.to_string(),
                to: status.to_string(),
            });
        }
        let updated = self
            .submission_repo
            .update_status(principal.company_id(), id, status)?
            .ok_or_else(|| JobsiteError::not_found("Incident", id))?;
        info!("Incident {id} is now {status}");
        Ok(updated)
    }
}

fn validate_form(submission_type: SubmissionType, form_data: &Value) -> Result<(), JobsiteError> {
    let Some(fields) = form_data.as_object() else {
        return Err(JobsiteError::BadInput(
            "formData must be a JSON object".to_string(),
        ));
    };
    let missing: Vec<&str> = submission_type
        .required_fields()
        .iter()
        .filter(|(field, shape)| {
            !fields
                .get(*field)
                .is_some_and(|value| matches_shape(value, *shape))
        })
        .map(|(field, _)| *field)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(JobsiteError::BadInput(format!(
            "{submission_type} requires {}",
            missing.join(", ")
        )))
    }
}

fn matches_shape(value: &Value, shape: FieldShape) -> bool {
    match shape {
        FieldShape::Present => !is_empty(value),
        FieldShape::List => value.as_array().is_some_and(|items| !items.is_empty()),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::{ContractorInput, MembershipTier};
    use crate::repository::contractor_repository::ContractorRepository;
    use serde_json::json;

    #[test]
    fn test_required_fields() {
        assert!(validate_form(
            SubmissionType::IncidentReport,
            &json!({"incidentDate": "2024-03-01", "description": "Slipped on ice"})
        )
        .is_ok());
        assert!(validate_form(
            SubmissionType::IncidentReport,
            &json!({"incidentDate": "2024-03-01", "description": "  "})
        )
        .is_err());
        assert!(validate_form(
            SubmissionType::VehicleInspection,
            &json!({"vehicleId": "T-12", "odometer": 0})
        )
        .is_ok());
        assert!(validate_form(
            SubmissionType::ToolboxTalk,
            &json!({"topic": "Ladders", "attendees": []})
        )
        .is_err());
        assert!(validate_form(SubmissionType::ToolboxTalk, &json!(["topic"])).is_err());
    }

    #[test]
    fn test_attendees_must_be_a_list() {
        for attendees in [json!("Bob"), json!({}), json!({"name": "Bob"}), json!(3)] {
            let result = validate_form(
                SubmissionType::ToolboxTalk,
                &json!({"topic": "Ladders", "attendees": attendees}),
            );
            assert!(
                matches!(result, Err(JobsiteError::BadInput(ref msg)) if msg.contains("attendees")),
                "{attendees} was accepted"
            );
        }
        assert!(validate_form(
            SubmissionType::ToolboxTalk,
            &json!({"topic": "Ladders", "attendees": ["Bob", "Alice"]})
        )
        .is_ok());
    }

    struct Fixture {
        service: SubmissionService,
        admin: Principal,
        ada: Principal,
        alan: Principal,
    }

    fn fixture() -> Result<Fixture, JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let contractors = db_manager.create_contractor_repository();
        let mut ids = Vec::new();
        for email in ["ada@crew.example", "alan@crew.example"] {
            let contractor = contractors.insert(
                company.id,
                &ContractorInput {
                    first_name: "Crew".to_string(),
                    last_name: "Member".to_string(),
                    email: email.to_string(),
                    ..Default::default()
                },
            )?;
            ids.push(contractor.id);
        }
        Ok(Fixture {
            service: SubmissionService::new(
                db_manager.create_submission_repository(),
                db_manager.create_project_repository(),
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
        })
    }

    fn incident() -> SubmissionInput {
        SubmissionInput {
            submission_type: SubmissionType::IncidentReport,
            project_id: None,
            form_data: json!({"incidentDate": "2024-03-01", "description": "Cut finger"}),
        }
    }

    #[test]
    fn test_foreign_submission_is_not_found() -> Result<(), JobsiteError> {
        let f = fixture()?;
        let mine = f.service.create(&f.ada, &incident())?;
        assert_eq!(mine.status, SubmissionStatus::Open);
        assert_eq!(mine.contractor_id, f.ada.contractor_id());

        assert!(matches!(
            f.service.delete(&f.alan, mine.id),
            Err(JobsiteError::NotFound { .. })
        ));
        let visible = f.service.list(&f.alan, &SubmissionFilter::default(), &PageRequest::default())?;
        assert_eq!(visible.pagination.total, 0);

        f.service.delete(&f.ada, mine.id)?;
        Ok(())
    }

    #[test]
    fn test_unknown_project() -> Result<(), JobsiteError> {
        let f = fixture()?;
        let input = SubmissionInput {
            project_id: Some(404),
            ..incident()
        };
        assert!(matches!(
            f.service.create(&f.admin, &input),
            Err(JobsiteError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_incident_workflow() -> Result<(), JobsiteError> {
        let f = fixture()?;
        let reported = f.service.create(&f.ada, &incident())?;
        let inspection = f.service.create(
            &f.admin,
            &SubmissionInput {
                submission_type: SubmissionType::VehicleInspection,
                project_id: None,
                form_data: json!({"vehicleId": "T-12", "odometer": 120_000}),
            },
        )?;
        assert_eq!(inspection.status, SubmissionStatus::Submitted);
        assert!(matches!(
            f.service.get_incident(&f.admin, inspection.id),
            Err(JobsiteError::NotFound { .. })
        ));

        let incidents = f
            .service
            .list_incidents(&f.admin, None, None, &PageRequest::default())?;
        assert_eq!(incidents.pagination.total, 1);

        assert!(matches!(
            f.service
                .update_incident_status(&f.ada, reported.id, SubmissionStatus::Closed),
            Err(JobsiteError::Forbidden(_))
        ));
        let investigating = f.service.update_incident_status(
            &f.admin,
            reported.id,
            SubmissionStatus::Investigating,
        )?;
        assert_eq!(investigating.status, SubmissionStatus::Investigating);
        assert!(matches!(
            f.service
                .update_incident_status(&f.admin, reported.id, SubmissionStatus::Open),
            Err(JobsiteError::InvalidTransition { .. })
        ));
        f.service
            .update_incident_status(&f.admin, reported.id, SubmissionStatus::Closed)?;
        Ok(())
    }
}
