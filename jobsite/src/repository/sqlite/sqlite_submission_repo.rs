use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::repository::sqlite::{lock, QueryConditions, SharedSqliteConnection};
use crate::repository::submission_repository::{
    NewSubmission, SubmissionFilter, SubmissionRepository,
};
use crate::types::{Submission, SubmissionStatus};
use chrono::Utc;
use log::debug;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};

pub struct SqliteSubmissionRepository {
    connection: SharedSqliteConnection,
}

const CREATE_SUBMISSION_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS submission (
        id integer primary key autoincrement not null,
        company_id integer not null,
        contractor_id integer,
        admin_id integer,
        project_id integer,
        submission_type varchar(64) not null,
        status varchar(32) not null,
        form_data text not null,
        submitted_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE,
        FOREIGN KEY (contractor_id) REFERENCES contractor(id) ON DELETE SET NULL,
        FOREIGN KEY (admin_id) REFERENCES admin(id) ON DELETE SET NULL,
        FOREIGN KEY (project_id) REFERENCES project(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS submission_company_type ON submission (company_id, submission_type);
";

/// Creates the `submission` table in the database.
pub(crate) fn create_submission_table(
    connection: &SharedSqliteConnection,
) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_SUBMISSION_TABLE_SQL)?;
    Ok(())
}

const SELECT_SUBMISSION: &str = "SELECT id, company_id, contractor_id, admin_id, project_id, submission_type, status, form_data, submitted_at FROM submission";

fn map_submission(row: &Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: row.get(0)?,
        company_id: row.get(1)?,
        contractor_id: row.get(2)?,
        admin_id: row.get(3)?,
        project_id: row.get(4)?,
        submission_type: row.get(5)?,
        status: row.get(6)?,
        form_data: row.get(7)?,
        submitted_at: row.get(8)?,
    })
}

fn select_submission(
    conn: &Connection,
    company_id: i64,
    submission_id: i64,
) -> Result<Option<Submission>, JobsiteError> {
    let submission = conn
        .query_row(
            &format!("{SELECT_SUBMISSION} WHERE id = ?1 AND company_id = ?2"),
            params![submission_id, company_id],
            map_submission,
        )
        .optional()?;
    Ok(submission)
}

impl SqliteSubmissionRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl SubmissionRepository for SqliteSubmissionRepository {
    fn insert(
        &self,
        company_id: i64,
        submission: &NewSubmission,
    ) -> Result<Submission, JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT INTO submission (
                company_id, contractor_id, admin_id, project_id, submission_type, status, form_data, submitted_at
            ) VALUES (
                :company_id, :contractor_id, :admin_id, :project_id, :submission_type, :status, :form_data, :submitted_at
            )",
            named_params! {
                ":company_id": company_id,
                ":contractor_id": submission.contractor_id,
                ":admin_id": submission.admin_id,
                ":project_id": submission.project_id,
                ":submission_type": submission.submission_type,
                ":status": submission.status,
                ":form_data": submission.form_data,
                ":submitted_at": Utc::now(),
            },
        )
        .map_err(|e| JobsiteError::Sql(format!("Unable to insert into submission: {e}")))?;
        let id = conn.last_insert_rowid();
        debug!(
            "Inserted {} submission {id} for company {company_id}",
            submission.submission_type
        );
        select_submission(&conn, company_id, id)?
            .ok_or_else(|| JobsiteError::not_found("Submission", id))
    }

    fn find_by_id(
        &self,
        company_id: i64,
        submission_id: i64,
    ) -> Result<Option<Submission>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_submission(&conn, company_id, submission_id)
    }

    fn list(
        &self,
        company_id: i64,
        filter: &SubmissionFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Submission>, i64), JobsiteError> {
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push_opt("submission_type = ?", filter.submission_type);
        conditions.push_opt("status = ?", filter.status);
        conditions.push_opt("project_id = ?", filter.project_id);
        conditions.push_opt("contractor_id = ?", filter.contractor_id);
        conditions.push_opt("substr(submitted_at, 1, 10) >= ?", filter.date_from);
        conditions.push_opt("substr(submitted_at, 1, 10) <= ?", filter.date_to);

        let conn = lock(&self.connection)?;
        let total = conditions.count(&conn, "submission")?;
        let rows = conditions.select_page(
            &conn,
            SELECT_SUBMISSION,
            "submitted_at DESC, id DESC",
            page,
            map_submission,
        )?;
        Ok((rows, total))
    }

    fn update_status(
        &self,
        company_id: i64,
        submission_id: i64,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE submission SET status = ?1 WHERE id = ?2 AND company_id = ?3",
            params![status, submission_id, company_id],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        select_submission(&conn, company_id, submission_id)
    }

    fn delete(&self, company_id: i64, submission_id: i64) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let deleted = conn.execute(
            "DELETE FROM submission WHERE id = ?1 AND company_id = ?2",
            params![submission_id, company_id],
        )?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::{MembershipTier, SubmissionType};
    use serde_json::json;

    fn incident(admin_id: i64) -> NewSubmission {
        NewSubmission {
            contractor_id: None,
            admin_id: Some(admin_id),
            project_id: None,
            submission_type: SubmissionType::IncidentReport,
            status: SubmissionStatus::Open,
            form_data: json!({"incidentDate": "2024-03-04", "description": "Slipped on ice"}),
        }
    }

    #[test]
    fn test_form_data_is_stored_as_json() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let repo = db_manager.create_submission_repository();

        let stored = repo.insert(company.id, &incident(admin.id))?;
        let found = repo
            .find_by_id(company.id, stored.id)?
            .expect("submission should exist");
        assert_eq!(found.form_data["description"], "Slipped on ice");
        assert_eq!(found.status, SubmissionStatus::Open);
        Ok(())
    }

    #[test]
    fn test_list_by_type_and_update_status() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, admin) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let repo = db_manager.create_submission_repository();
        let stored = repo.insert(company.id, &incident(admin.id))?;
        repo.insert(
            company.id,
            &NewSubmission {
                submission_type: SubmissionType::VehicleInspection,
                status: SubmissionStatus::Submitted,
                form_data: json!({"vehicleId": "T-1", "odometer": 1200}),
                ..incident(admin.id)
            },
        )?;

        let filter = SubmissionFilter {
            submission_type: Some(SubmissionType::IncidentReport),
            ..Default::default()
        };
        let (rows, total) = repo.list(company.id, &filter, &PageRequest::default())?;
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, stored.id);

        let updated = repo
            .update_status(company.id, stored.id, SubmissionStatus::Investigating)?
            .expect("submission should exist");
        assert_eq!(updated.status, SubmissionStatus::Investigating);

        assert!(repo.delete(company.id, stored.id)?);
        assert!(!repo.delete(company.id, stored.id)?);
        Ok(())
    }
}
