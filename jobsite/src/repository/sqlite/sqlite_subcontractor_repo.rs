use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::repository::sqlite::{lock, QueryConditions, SharedSqliteConnection};
use crate::repository::subcontractor_repository::SubcontractorRepository;
use crate::types::{Subcontractor, SubcontractorInput};
use chrono::Utc;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};

pub struct SqliteSubcontractorRepository {
    connection: SharedSqliteConnection,
}

const CREATE_SUBCONTRACTOR_TABLES_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS subcontractor (
        id integer primary key autoincrement not null,
        company_id integer not null,
        name varchar(512) not null,
        contact_name varchar(512),
        contact_email varchar(1024),
        contact_phone varchar(64),
        trade varchar(256),
        created_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE
    );
    CREATE UNIQUE INDEX IF NOT EXISTS subcontractor_company_name
        ON subcontractor (company_id, name collate nocase);
    CREATE TABLE IF NOT EXISTS project_subcontractor (
        project_id integer not null,
        subcontractor_id integer not null,
        PRIMARY KEY (project_id, subcontractor_id),
        FOREIGN KEY (project_id) REFERENCES project(id) ON DELETE CASCADE,
        FOREIGN KEY (subcontractor_id) REFERENCES subcontractor(id) ON DELETE CASCADE
    );
";

/// Creates the `subcontractor` and `project_subcontractor` tables in the database.
pub(crate) fn create_subcontractor_tables(
    connection: &SharedSqliteConnection,
) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_SUBCONTRACTOR_TABLES_SQL)?;
    Ok(())
}

const SELECT_SUBCONTRACTOR: &str = "SELECT id, company_id, name, contact_name, contact_email, contact_phone, trade, created_at FROM subcontractor";

fn map_subcontractor(row: &Row<'_>) -> rusqlite::Result<Subcontractor> {
    Ok(Subcontractor {
        id: row.get(0)?,
        company_id: row.get(1)?,
        name: row.get(2)?,
        contact_name: row.get(3)?,
        contact_email: row.get(4)?,
        contact_phone: row.get(5)?,
        trade: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn select_subcontractor(
    conn: &Connection,
    company_id: i64,
    subcontractor_id: i64,
) -> Result<Option<Subcontractor>, JobsiteError> {
    let subcontractor = conn
        .query_row(
            &format!("{SELECT_SUBCONTRACTOR} WHERE id = ?1 AND company_id = ?2"),
            params![subcontractor_id, company_id],
            map_subcontractor,
        )
        .optional()?;
    Ok(subcontractor)
}

impl SqliteSubcontractorRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl SubcontractorRepository for SqliteSubcontractorRepository {
    fn insert(
        &self,
        company_id: i64,
        input: &SubcontractorInput,
    ) -> Result<Subcontractor, JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT INTO subcontractor (company_id, name, contact_name, contact_email, contact_phone, trade, created_at)
             VALUES (:company_id, :name, :contact_name, :contact_email, :contact_phone, :trade, :created_at)",
            named_params! {
                ":company_id": company_id,
                ":name": input.name.trim(),
                ":contact_name": input.contact_name,
                ":contact_email": input.contact_email,
                ":contact_phone": input.contact_phone,
                ":trade": input.trade,
                ":created_at": Utc::now(),
            },
        )?;
        let id = conn.last_insert_rowid();
        select_subcontractor(&conn, company_id, id)?
            .ok_or_else(|| JobsiteError::not_found("Subcontractor", id))
    }

    fn update(
        &self,
        company_id: i64,
        subcontractor_id: i64,
        input: &SubcontractorInput,
    ) -> Result<Option<Subcontractor>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE subcontractor SET name = :name, contact_name = :contact_name,
                contact_email = :contact_email, contact_phone = :contact_phone, trade = :trade
             WHERE id = :id AND company_id = :company_id",
            named_params! {
                ":id": subcontractor_id,
                ":company_id": company_id,
                ":name": input.name.trim(),
                ":contact_name": input.contact_name,
                ":contact_email": input.contact_email,
                ":contact_phone": input.contact_phone,
                ":trade": input.trade,
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        select_subcontractor(&conn, company_id, subcontractor_id)
    }

    fn delete(&self, company_id: i64, subcontractor_id: i64) -> Result<bool, JobsiteError> {
        let mut conn = lock(&self.connection)?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE contractor SET subcontractor_id = NULL WHERE subcontractor_id = ?1 AND company_id = ?2",
            params![subcontractor_id, company_id],
        )?;
        let deleted = tx.execute(
            "DELETE FROM subcontractor WHERE id = ?1 AND company_id = ?2",
            params![subcontractor_id, company_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    fn find_by_id(
        &self,
        company_id: i64,
        subcontractor_id: i64,
    ) -> Result<Option<Subcontractor>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_subcontractor(&conn, company_id, subcontractor_id)
    }

    fn find_by_name(
        &self,
        company_id: i64,
        name: &str,
    ) -> Result<Option<Subcontractor>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let subcontractor = conn
            .query_row(
                &format!(
                    "{SELECT_SUBCONTRACTOR} WHERE company_id = ?1 AND name = ?2 collate nocase"
                ),
                params![company_id, name.trim()],
                map_subcontractor,
            )
            .optional()?;
        Ok(subcontractor)
    }

    fn list(
        &self,
        company_id: i64,
        search: Option<&str>,
        page: &PageRequest,
    ) -> Result<(Vec<Subcontractor>, i64), JobsiteError> {
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push_search(&["name", "trade", "contact_name"], search);

        let conn = lock(&self.connection)?;
        let total = conditions.count(&conn, "subcontractor")?;
        let rows = conditions.select_page(
            &conn,
            SELECT_SUBCONTRACTOR,
            "name collate nocase, id",
            page,
            map_subcontractor,
        )?;
        Ok((rows, total))
    }

    fn attach_to_project(
        &self,
        project_id: i64,
        subcontractor_id: i64,
    ) -> Result<(), JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT OR IGNORE INTO project_subcontractor (project_id, subcontractor_id) VALUES (?1, ?2)",
            params![project_id, subcontractor_id],
        )?;
        Ok(())
    }

    fn detach_from_project(
        &self,
        project_id: i64,
        subcontractor_id: i64,
    ) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let deleted = conn.execute(
            "DELETE FROM project_subcontractor WHERE project_id = ?1 AND subcontractor_id = ?2",
            params![project_id, subcontractor_id],
        )?;
        Ok(deleted > 0)
    }

    fn find_by_project(
        &self,
        company_id: i64,
        project_id: i64,
    ) -> Result<Vec<Subcontractor>, JobsiteError> {
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push(
            "id IN (SELECT subcontractor_id FROM project_subcontractor WHERE project_id = ?)",
            project_id,
        );
        let conn = lock(&self.connection)?;
        conditions.select_all(
            &conn,
            SELECT_SUBCONTRACTOR,
            "name collate nocase, id",
            map_subcontractor,
        )
    }
}
