use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::repository::project_repository::{ProjectFilter, ProjectRepository};
use crate::repository::sqlite::{lock, QueryConditions, SharedSqliteConnection};
use crate::types::{MembershipTier, Project, ProjectInput, ProjectStatus};
use chrono::Utc;
use log::debug;
use num_traits::ToPrimitive;
use rusqlite::{
    ffi, named_params, params, Connection, OptionalExtension, Row, TransactionBehavior,
};

pub struct SqliteProjectRepository {
    connection: SharedSqliteConnection,
}

/// SQL statement to create the `project` table.
const CREATE_PROJECT_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS project (
        id integer primary key autoincrement not null,
        company_id integer not null,
        name varchar(512) not null,
        project_number varchar(128),
        address varchar(1024),
        city varchar(256),
        status varchar(32) not null,
        start_date date,
        end_date date,
        created_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE
    );
    CREATE UNIQUE INDEX IF NOT EXISTS project_company_name
        ON project (company_id, name collate nocase);
";

/// Creates the `project` table in the database.
pub(crate) fn create_project_table(connection: &SharedSqliteConnection) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_PROJECT_TABLE_SQL)?;
    Ok(())
}

const SELECT_PROJECT: &str = "SELECT id, company_id, name, project_number, address, city, status, start_date, end_date, created_at FROM project";

fn map_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        company_id: row.get(1)?,
        name: row.get(2)?,
        project_number: row.get(3)?,
        address: row.get(4)?,
        city: row.get(5)?,
        status: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn select_project(
    conn: &Connection,
    company_id: i64,
    project_id: i64,
) -> Result<Option<Project>, JobsiteError> {
    let project = conn
        .query_row(
            &format!("{SELECT_PROJECT} WHERE id = ?1 AND company_id = ?2"),
            params![project_id, company_id],
            map_project,
        )
        .optional()?;
    Ok(project)
}

/// Maps a violation of the per-company name index to `Conflict`.
fn insert_error(err: &rusqlite::Error, input: &ProjectInput) -> JobsiteError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            JobsiteError::Conflict(format!(
                "A project named '{}' already exists",
                input.name.trim()
            ))
        }
        _ => JobsiteError::Sql(format!("Unable to insert into project: {err}")),
    }
}

impl SqliteProjectRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl ProjectRepository for SqliteProjectRepository {
    fn insert(&self, company_id: i64, input: &ProjectInput) -> Result<Project, JobsiteError> {
        let mut conn = lock(&self.connection)?;
        // Immediate takes the write lock before the count
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tier: MembershipTier = tx
            .query_row(
                "SELECT tier FROM company WHERE id = ?1",
                params![company_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| JobsiteError::not_found("Company", company_id))?;
        if let Some(limit) = tier.project_limit() {
            let count = QueryConditions::for_company(company_id).count(&tx, "project")?;
            if count.to_u32().unwrap_or(u32::MAX) >= limit {
                debug!("Company {company_id} has {count} projects, the limit is {limit}");
                return Err(JobsiteError::ProjectLimitReached {
                    tier: tier.to_string(),
                    limit,
                });
            }
        }
        tx.execute(
            "INSERT INTO project (
                company_id, name, project_number, address, city, status, start_date, end_date, created_at
            ) VALUES (
                :company_id, :name, :project_number, :address, :city, :status, :start_date, :end_date, :created_at
            )",
            named_params! {
                ":company_id": company_id,
                ":name": input.name.trim(),
                ":project_number": input.project_number,
                ":address": input.address,
                ":city": input.city,
                ":status": input.status.unwrap_or(ProjectStatus::Active),
                ":start_date": input.start_date,
                ":end_date": input.end_date,
                ":created_at": Utc::now(),
            },
        )
        .map_err(|e| insert_error(&e, input))?;
        let id = tx.last_insert_rowid();
        let project =
            select_project(&tx, company_id, id)?.ok_or_else(|| JobsiteError::not_found("Project", id))?;
        tx.commit()?;
        debug!("Inserted project {id} for company {company_id}");
        Ok(project)
    }

    fn update(
        &self,
        company_id: i64,
        project_id: i64,
        input: &ProjectInput,
    ) -> Result<Option<Project>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE project SET
                name = :name, project_number = :project_number, address = :address, city = :city,
                status = coalesce(:status, status), start_date = :start_date, end_date = :end_date
             WHERE id = :id AND company_id = :company_id",
            named_params! {
                ":id": project_id,
                ":company_id": company_id,
                ":name": input.name.trim(),
                ":project_number": input.project_number,
                ":address": input.address,
                ":city": input.city,
                ":status": input.status,
                ":start_date": input.start_date,
                ":end_date": input.end_date,
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        select_project(&conn, company_id, project_id)
    }

    fn delete(&self, company_id: i64, project_id: i64) -> Result<bool, JobsiteError> {
        let mut conn = lock(&self.connection)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let has_timesheets: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM timesheet WHERE project_id = ?1 AND company_id = ?2)",
            params![project_id, company_id],
            |row| row.get(0),
        )?;
        if has_timesheets {
            return Err(JobsiteError::Conflict(
                "The project has timesheets and can not be deleted".to_string(),
            ));
        }
        tx.execute(
            "DELETE FROM project_document WHERE project_id = ?1 AND company_id = ?2",
            params![project_id, company_id],
        )?;
        tx.execute(
            "DELETE FROM project_subcontractor WHERE project_id = ?1
                AND project_id IN (SELECT id FROM project WHERE company_id = ?2)",
            params![project_id, company_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM project WHERE id = ?1 AND company_id = ?2",
            params![project_id, company_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn find_by_id(
        &self,
        company_id: i64,
        project_id: i64,
    ) -> Result<Option<Project>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_project(&conn, company_id, project_id)
    }

    fn find_by_name(&self, company_id: i64, name: &str) -> Result<Option<Project>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let project = conn
            .query_row(
                &format!("{SELECT_PROJECT} WHERE company_id = ?1 AND name = ?2 collate nocase"),
                params![company_id, name.trim()],
                map_project,
            )
            .optional()?;
        Ok(project)
    }

    fn count_for_company(&self, company_id: i64) -> Result<i64, JobsiteError> {
        let conn = lock(&self.connection)?;
        QueryConditions::for_company(company_id).count(&conn, "project")
    }

    fn list(
        &self,
        company_id: i64,
        filter: &ProjectFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Project>, i64), JobsiteError> {
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push_search(&["name", "project_number"], filter.search.as_deref());
        conditions.push_opt("status = ?", filter.status);

        let conn = lock(&self.connection)?;
        let total = conditions.count(&conn, "project")?;
        let projects =
            conditions.select_page(&conn, SELECT_PROJECT, "created_at DESC, id DESC", page, map_project)?;
        Ok((projects, total))
    }

}
