use crate::error::JobsiteError;
use crate::repository::company_repository::CompanyRepository;
use crate::repository::sqlite::{lock, SharedSqliteConnection};
use crate::types::{Admin, Company, MembershipTier};
use chrono::Utc;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub struct SqliteCompanyRepository {
    connection: SharedSqliteConnection,
}

/// SQL statements to create the `company` and `admin` tables.
const CREATE_COMPANY_TABLES_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS company (
        id integer primary key autoincrement not null,
        name varchar(512) not null,
        tier varchar(32) not null,
        created_at datetime not null
    );
    CREATE TABLE IF NOT EXISTS admin (
        id integer primary key autoincrement not null,
        company_id integer not null,
        email varchar(1024) not null unique collate nocase,
        name varchar(512) not null,
        created_at datetime not null,
        FOREIGN KEY (company_id) REFERENCES company(id) ON DELETE CASCADE
    );
";

/// Creates the `company` and `admin` tables in the database.
pub(crate) fn create_company_tables(connection: &SharedSqliteConnection) -> Result<(), JobsiteError> {
    let conn = lock(connection)?;
    conn.execute_batch(CREATE_COMPANY_TABLES_SQL)?;
    Ok(())
}

const SELECT_COMPANY: &str = "SELECT id, name, tier, created_at FROM company";
const SELECT_ADMIN: &str = "SELECT id, company_id, email, name, created_at FROM admin";

fn map_company(row: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get(1)?,
        tier: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_admin(row: &Row<'_>) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get(0)?,
        company_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn select_company(conn: &Connection, company_id: i64) -> Result<Option<Company>, JobsiteError> {
    let company = conn
        .query_row(
            &format!("{SELECT_COMPANY} WHERE id = ?1"),
            params![company_id],
            map_company,
        )
        .optional()?;
    Ok(company)
}

impl SqliteCompanyRepository {
    pub(crate) fn new(connection: SharedSqliteConnection) -> Self {
        Self { connection }
    }
}

impl CompanyRepository for SqliteCompanyRepository {
    fn create_company(&self, name: &str, tier: MembershipTier) -> Result<Company, JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT INTO company (name, tier, created_at) VALUES (?1, ?2, ?3)",
            params![name, tier, Utc::now()],
        )
        .map_err(|e| JobsiteError::Sql(format!("Unable to insert company {name}: {e}")))?;
        let id = conn.last_insert_rowid();
        debug!("Created company {id} '{name}' on the {tier} tier");
        select_company(&conn, id)?.ok_or_else(|| JobsiteError::not_found("Company", id))
    }

    fn find_company(&self, company_id: i64) -> Result<Option<Company>, JobsiteError> {
        let conn = lock(&self.connection)?;
        select_company(&conn, company_id)
    }

    fn update_tier(&self, company_id: i64, tier: MembershipTier) -> Result<bool, JobsiteError> {
        let conn = lock(&self.connection)?;
        let changed = conn.execute(
            "UPDATE company SET tier = ?1 WHERE id = ?2",
            params![tier, company_id],
        )?;
        Ok(changed > 0)
    }

    fn create_admin(
        &self,
        company_id: i64,
        email: &str,
        name: &str,
    ) -> Result<Admin, JobsiteError> {
        let conn = lock(&self.connection)?;
        conn.execute(
            "INSERT INTO admin (company_id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![company_id, email, name, Utc::now()],
        )
        .map_err(|e| JobsiteError::Sql(format!("Unable to insert admin {email}: {e}")))?;
        let id = conn.last_insert_rowid();
        let admin = conn.query_row(
            &format!("{SELECT_ADMIN} WHERE id = ?1"),
            params![id],
            map_admin,
        )?;
        Ok(admin)
    }

    fn find_admin(&self, company_id: i64, admin_id: i64) -> Result<Option<Admin>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let admin = conn
            .query_row(
                &format!("{SELECT_ADMIN} WHERE id = ?1 AND company_id = ?2"),
                params![admin_id, company_id],
                map_admin,
            )
            .optional()?;
        Ok(admin)
    }

    fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, JobsiteError> {
        let conn = lock(&self.connection)?;
        let admin = conn
            .query_row(
                &format!("{SELECT_ADMIN} WHERE email = ?1"),
                params![email.trim()],
                map_admin,
            )
            .optional()?;
        Ok(admin)
    }
}
