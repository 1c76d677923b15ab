use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::repository::sqlite::{lock, QueryConditions, SharedSqliteConnection};
use crate::repository::timesheet_repository::{
    TimesheetFilter, TimesheetRepository, TimesheetReview,
};
use crate::types::{Timesheet, TimesheetInput, TimesheetStatus, TimesheetStatusSummary};
use chrono::{NaiveDate, Utc};
use log::debug;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

pub struct SqliteTimesheetRepository {
    connection: SharedSqliteConnection,
}

const CREATE_TIMESHEET_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS timesheet (
        id integer primary key autoincrement not null,
        company_id integer not null,
        contractor_id integer not null,
        project_id integer not null,
        work_date date not null,
        hours real not null,
        description varchar(4096),
        status varchar(32) not null,
        rejection_reason varchar(4096),
        reviewed_by integer,
        reviewed_at datetime,
        created_at datetime not null,
        updated_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE,
        FOREIGN KEY (contractor_id) REFERENCES contractor(id),
        FOREIGN KEY (project_id) REFERENCES project(id)
    );
    CREATE INDEX IF NOT EXISTS timesheet_project_date ON timesheet (project_id, work_date);
    CREATE INDEX IF NOT EXISTS timesheet_contractor ON timesheet (contractor_id);
";

/// Creates the `timesheet` table in the database.
pub(crate) fn create_timesheet_table(
    connection: &SharedSqliteConnection,
) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_TIMESHEET_TABLE_SQL)?;
    Ok(())
}

const SELECT_TIMESHEET: &str = "SELECT id, company_id, contractor_id, project_id, work_date, hours, description, status, rejection_reason, reviewed_by, reviewed_at, created_at, updated_at FROM timesheet";

fn map_timesheet(row: &Row<'_>) -> rusqlite::Result<Timesheet> {
    Ok(Timesheet {
        id: row.get(0)?,
        company_id: row.get(1)?,
        contractor_id: row.get(2)?,
        project_id: row.get(3)?,
        work_date: row.get(4)?,
        hours: row.get(5)?,
        description: row.get(6)?,
        status: row.get(7)?,
        rejection_reason: row.get(8)?,
        reviewed_by: row.get(9)?,
        reviewed_at: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn select_timesheet(
    conn: &Connection,
    company_id: i64,
    timesheet_id: i64,
) -> Result<Option<Timesheet>, JobsiteError> {
    let timesheet = conn
        .query_row(
            &format!("{SELECT_TIMESHEET} WHERE id = ?1 AND company_id = ?2"),
            params![timesheet_id, company_id],
            map_timesheet,
        )
        .optional()?;
    Ok(timesheet)
}

fn date_range_conditions(
    company_id: i64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> QueryConditions {
    let mut conditions = QueryConditions::for_company(company_id);
    conditions.push_opt("work_date >= ?", from);
    conditions.push_opt("work_date <= ?", to);
    conditions
}

impl SqliteTimesheetRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl TimesheetRepository for SqliteTimesheetRepository {
    fn insert(
        &self,
        company_id: i64,
        contractor_id: i64,
        input: &TimesheetInput,
    ) -> Result<Timesheet, JobsiteError> {
        let conn = lock(&self.connection)?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO timesheet (
                company_id, contractor_id, project_id, work_date, hours, description, status, created_at, updated_at
            ) VALUES (
                :company_id, :contractor_id, :project_id, :work_date, :hours, :description, :status, :now, :now
            )",
            named_params! {
                ":company_id": company_id,
                ":contractor_id": contractor_id,
                ":project_id": input.project_id,
                ":work_date": input.work_date,
                ":hours": input.hours,
                ":description": input.description,
                ":status": TimesheetStatus::Pending,
                ":now": now,
            },
        )
        .map_err(|e| JobsiteError::Sql(format!("Unable to insert into timesheet: {e}")))?;
        let id = conn.last_insert_rowid();
        debug!("Inserted timesheet {id} for contractor {contractor_id}");
        select_timesheet(&conn, company_id, id)?
            .ok_or_else(|| JobsiteError::not_found("Timesheet", id))
    }

    fn update(
        &self,
        company_id: i64,
        timesheet_id: i64,
        input: &TimesheetInput,
    ) -> Result<Option<Timesheet>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE timesheet SET project_id = :project_id, work_date = :work_date, hours = :hours,
                description = :description, updated_at = :now
             WHERE id = :id AND company_id = :company_id AND status = :pending",
            named_params! {
                ":id": timesheet_id,
                ":company_id": company_id,
                ":project_id": input.project_id,
                ":work_date": input.work_date,
                ":hours": input.hours,
                ":description": input.description,
                ":now": Utc::now(),
                ":pending": TimesheetStatus::Pending,
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        select_timesheet(&conn, company_id, timesheet_id)
    }

    fn review(
        &self,
        company_id: i64,
        timesheet_id: i64,
        expected: TimesheetStatus,
        review: &TimesheetReview,
    ) -> Result<Option<Timesheet>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE timesheet SET status = :status, rejection_reason = :reason,
                reviewed_by = :reviewed_by, reviewed_at = :reviewed_at, updated_at = :reviewed_at
             WHERE id = :id AND company_id = :company_id AND status = :expected",
            named_params! {
                ":id": timesheet_id,
                ":company_id": company_id,
                ":status": review.status,
                ":reason": review.rejection_reason,
                ":reviewed_by": review.reviewed_by,
                ":reviewed_at": review.reviewed_at,
                ":expected": expected,
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        debug!(
            "Timesheet {timesheet_id} moved from {expected} to {}",
            review.status
        );
        select_timesheet(&conn, company_id, timesheet_id)
    }

    fn delete(&self, company_id: i64, timesheet_id: i64) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let deleted = conn.execute(
            "DELETE FROM timesheet WHERE id = ?1 AND company_id = ?2",
            params![timesheet_id, company_id],
        )?;
        Ok(deleted > 0)
    }

    fn find_by_id(
        &self,
        company_id: i64,
        timesheet_id: i64,
    ) -> Result<Option<Timesheet>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_timesheet(&conn, company_id, timesheet_id)
    }

    fn list(
        &self,
        company_id: i64,
        filter: &TimesheetFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Timesheet>, i64), JobsiteError> {
        let mut conditions = date_range_conditions(company_id, filter.date_from, filter.date_to);
        conditions.push_opt("status = ?", filter.status);
        conditions.push_opt("project_id = ?", filter.project_id);
        conditions.push_opt("contractor_id = ?", filter.contractor_id);

        let conn = lock(&self.connection)?;
        let total = conditions.count(&conn, "timesheet")?;
        let rows = conditions.select_page(
            &conn,
            SELECT_TIMESHEET,
            "work_date DESC, id DESC",
            page,
            map_timesheet,
        )?;
        Ok((rows, total))
    }

    fn find_approved_for_project(
        &self,
        company_id: i64,
        project_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Timesheet>, JobsiteError> {
        let mut conditions = date_range_conditions(company_id, Some(from), Some(to));
        conditions.push("project_id = ?", project_id);
        conditions.push("status = ?", TimesheetStatus::Approved);

        let conn = lock(&self.connection)?;
        conditions.select_all(&conn, SELECT_TIMESHEET, "work_date, id", map_timesheet)
    }

    fn summary(
        &self,
        company_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<TimesheetStatusSummary>, JobsiteError> {
        let conditions = date_range_conditions(company_id, from, to);
        let sql = format!(
            "SELECT status, count(*), coalesce(sum(hours), 0.0) FROM timesheet{} GROUP BY status",
            conditions.where_clause()
        );

        let conn = lock(&self.connection)?;
        let mut stmt = conn.prepare(&sql)?;
        let grouped = stmt
            .query_map(conditions.params().as_slice(), |row| {
                Ok((
                    row.get::<_, TimesheetStatus>(0)?,
                    (row.get::<_, i64>(1)?, row.get::<_, f64>(2)?),
                ))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        // Every status is reported, also those without any timesheets
        let summary = [
            TimesheetStatus::Pending,
            TimesheetStatus::Approved,
            TimesheetStatus::Rejected,
        ]
        .into_iter()
        .map(|status| {
            let (count, hours) = grouped.get(&status).copied().unwrap_or((0, 0.0));
            TimesheetStatusSummary {
                status,
                count,
                hours,
            }
        })
        .collect();
        Ok(summary)
    }
}
