use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use crate::repository::contractor_repository::{ContractorFilter, ContractorRepository};
use crate::repository::sqlite::{lock, QueryConditions, SharedSqliteConnection};
use crate::types::{Contractor, ContractorInput};
use chrono::Utc;
use log::debug;
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};

pub struct SqliteContractorRepository {
    connection: SharedSqliteConnection,
}

const CREATE_CONTRACTOR_TABLE_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS contractor (
        id integer primary key autoincrement not null,
        company_id integer not null,
        subcontractor_id integer,
        first_name varchar(256) not null,
        last_name varchar(256) not null,
        email varchar(1024) not null,
        trade varchar(256),
        city varchar(256),
        hourly_rate_cents integer not null,
        fringe_rate_cents integer not null default 0,
        active boolean not null default 1,
        created_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE,
        FOREIGN KEY (subcontractor_id) REFERENCES subcontractor(id) ON DELETE SET NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS contractor_company_email
        ON contractor (company_id, email collate nocase);
";

/// Creates the `contractor` table in the database.
pub(crate) fn create_contractor_table(
    connection: &SharedSqliteConnection,
) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_CONTRACTOR_TABLE_SQL)?;
    Ok(())
}

const SELECT_CONTRACTOR: &str = "SELECT id, company_id, subcontractor_id, first_name, last_name, email, trade, city, hourly_rate_cents, fringe_rate_cents, active, created_at FROM contractor";

fn map_contractor(row: &Row<'_>) -> rusqlite::Result<Contractor> {
    Ok(Contractor {
        id: row.get(0)?,
        company_id: row.get(1)?,
        subcontractor_id: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        trade: row.get(6)?,
        city: row.get(7)?,
        hourly_rate_cents: row.get(8)?,
        fringe_rate_cents: row.get(9)?,
        active: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn select_contractor(
    conn: &Connection,
    company_id: i64,
    contractor_id: i64,
) -> Result<Option<Contractor>, JobsiteError> {
    let contractor = conn
        .query_row(
            &format!("{SELECT_CONTRACTOR} WHERE id = ?1 AND company_id = ?2"),
            params![contractor_id, company_id],
            map_contractor,
        )
        .optional()?;
    Ok(contractor)
}

impl SqliteContractorRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl ContractorRepository for SqliteContractorRepository {
    fn insert(&self, company_id: i64, input: &ContractorInput) -> Result<Contractor, JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT INTO contractor (
                company_id, subcontractor_id, first_name, last_name, email, trade, city,
                hourly_rate_cents, fringe_rate_cents, active, created_at
            ) VALUES (
                :company_id, :subcontractor_id, :first_name, :last_name, :email, :trade, :city,
                :hourly_rate_cents, :fringe_rate_cents, :active, :created_at
            )",
            named_params! {
                ":company_id": company_id,
                ":subcontractor_id": input.subcontractor_id,
                ":first_name": input.first_name.trim(),
                ":last_name": input.last_name.trim(),
                ":email": input.email.trim(),
                ":trade": input.trade,
                ":city": input.city,
                ":hourly_rate_cents": input.hourly_rate_cents,
                ":fringe_rate_cents": input.fringe_rate_cents,
                ":active": input.active.unwrap_or(true),
                ":created_at": Utc::now(),
            },
        )
        .map_err(|e| JobsiteError::Sql(format!("Unable to insert into contractor: {e}")))?;
        let id = conn.last_insert_rowid();
        debug!("Inserted contractor {id} for company {company_id}");
        select_contractor(&conn, company_id, id)?
            .ok_or_else(|| JobsiteError::not_found("Contractor", id))
    }

    fn update(
        &self,
        company_id: i64,
        contractor_id: i64,
        input: &ContractorInput,
    ) -> Result<Option<Contractor>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE contractor SET
                subcontractor_id = :subcontractor_id, first_name = :first_name, last_name = :last_name,
                email = :email, trade = :trade, city = :city, hourly_rate_cents = :hourly_rate_cents,
                fringe_rate_cents = :fringe_rate_cents, active = coalesce(:active, active)
             WHERE id = :id AND company_id = :company_id",
            named_params! {
                ":id": contractor_id,
                ":company_id": company_id,
                ":subcontractor_id": input.subcontractor_id,
                ":first_name": input.first_name.trim(),
                ":last_name": input.last_name.trim(),
                ":email": input.email.trim(),
                ":trade": input.trade,
                ":city": input.city,
                ":hourly_rate_cents": input.hourly_rate_cents,
                ":fringe_rate_cents": input.fringe_rate_cents,
                ":active": input.active,
            },
        )?;
        if changed == 0 {
            return Ok(None);
        }
        select_contractor(&conn, company_id, contractor_id)
    }

    fn delete(&self, company_id: i64, contractor_id: i64) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let deleted = conn.execute(
            "DELETE FROM contractor WHERE id = ?1 AND company_id = ?2",
            params![contractor_id, company_id],
        )?;
        Ok(deleted > 0)
    }

    fn deactivate(&self, company_id: i64, contractor_id: i64) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE contractor SET active = 0 WHERE id = ?1 AND company_id = ?2",
            params![contractor_id, company_id],
        )?;
        Ok(changed > 0)
    }

    fn find_by_id(
        &self,
        company_id: i64,
        contractor_id: i64,
    ) -> Result<Option<Contractor>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_contractor(&conn, company_id, contractor_id)
    }

    fn find_by_email(
        &self,
        company_id: i64,
        email: &str,
    ) -> Result<Option<Contractor>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let contractor = conn
            .query_row(
                &format!("{SELECT_CONTRACTOR} WHERE company_id = ?1 AND email = ?2 collate nocase"),
                params![company_id, email.trim()],
                map_contractor,
            )
            .optional()?;
        Ok(contractor)
    }

    fn find_by_ids(&self, company_id: i64, ids: &[i64]) -> Result<Vec<Contractor>, JobsiteError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push_all(&format!("id IN ({placeholders})"), ids);

        let conn = lock(&self.connection)?;
        conditions.select_all(&conn, SELECT_CONTRACTOR, "last_name, first_name, id", map_contractor)
    }

    fn list(
        &self,
        company_id: i64,
        filter: &ContractorFilter,
        page: &PageRequest,
    ) -> Result<(Vec<Contractor>, i64), JobsiteError> {
        let mut conditions = QueryConditions::for_company(company_id);
        conditions.push_search(&["first_name", "last_name", "email"], filter.search.as_deref());
        conditions.push_opt("active = ?", filter.active);
        conditions.push_opt("subcontractor_id = ?", filter.subcontractor_id);

        let conn = lock(&self.connection)?;
        let total = conditions.count(&conn, "contractor")?;
        let rows = conditions.select_page(
            &conn,
            SELECT_CONTRACTOR,
            "last_name collate nocase, first_name collate nocase, id",
            page,
            map_contractor,
        )?;
        Ok((rows, total))
    }

    fn has_timesheets(&self, company_id: i64, contractor_id: i64) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM timesheet WHERE contractor_id = ?1 AND company_id = ?2)",
            params![contractor_id, company_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sqlite::tests::{create_company_for_test, test_database_manager};
    use crate::types::MembershipTier;

    fn contractor_input(first: &str, last: &str) -> ContractorInput {
        ContractorInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@crew.example", first.to_lowercase(), last.to_lowercase()),
            trade: Some("Carpenter".to_string()),
            city: Some("Springfield".to_string()),
            hourly_rate_cents: 4_000,
            fringe_rate_cents: 1_250,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_find_and_deactivate() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, _) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let repo = db_manager.create_contractor_repository();

        let contractor = repo.insert(company.id, &contractor_input("Ada", "Lovelace"))?;
        assert!(contractor.active);
        assert_eq!(contractor.hourly_rate_cents, 4_000);

        let found = repo.find_by_email(company.id, "ADA.LOVELACE@crew.example")?;
        assert_eq!(found.map(|c| c.id), Some(contractor.id));

        assert!(repo.deactivate(company.id, contractor.id)?);
        let found = repo
            .find_by_id(company.id, contractor.id)?
            .expect("contractor should exist");
        assert!(!found.active);
        Ok(())
    }

    #[test]
    fn test_find_by_ids_and_filter() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, _) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let repo = db_manager.create_contractor_repository();
        let ada = repo.insert(company.id, &contractor_input("Ada", "Lovelace"))?;
        let alan = repo.insert(company.id, &contractor_input("Alan", "Turing"))?;
        repo.deactivate(company.id, alan.id)?;

        let found = repo.find_by_ids(company.id, &[alan.id, ada.id, 9999])?;
        assert_eq!(found.len(), 2);
        assert!(repo.find_by_ids(company.id, &[])?.is_empty());

        let filter = ContractorFilter {
            active: Some(true),
            ..Default::default()
        };
        let (rows, total) = repo.list(company.id, &filter, &PageRequest::default())?;
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, ada.id);

        let filter = ContractorFilter {
            search: Some("turing".to_string()),
            ..Default::default()
        };
        let (rows, _) = repo.list(company.id, &filter, &PageRequest::default())?;
        assert_eq!(rows[0].id, alan.id);
        Ok(())
    }

    #[test]
    fn test_duplicate_email_in_company_fails() -> Result<(), JobsiteError> {
        let db_manager = test_database_manager()?;
        let (company, _) = create_company_for_test(&db_manager, MembershipTier::Basic)?;
        let repo = db_manager.create_contractor_repository();
        repo.insert(company.id, &contractor_input("Ada", "Lovelace"))?;
        assert!(repo
            .insert(company.id, &contractor_input("Ada", "Lovelace"))
            .is_err());
        Ok(())
    }
}
