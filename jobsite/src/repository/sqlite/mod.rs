use crate::error::JobsiteError;
use crate::pagination::PageRequest;
use rusqlite::{Connection, Row, ToSql};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) mod sqlite_company_repo;
pub(crate) mod sqlite_contractor_repo;
pub(crate) mod sqlite_document_repo;
pub(crate) mod sqlite_project_repo;
pub(crate) mod sqlite_subcontractor_repo;
pub(crate) mod sqlite_submission_repo;
pub(crate) mod sqlite_timesheet_repo;
pub(crate) mod sqlite_toolbox_talk_repo;

/// A thread-safe, shared connection to an ``SQLite`` database,
/// used across multiple repository layers.
pub(crate) type SharedSqliteConnection = Arc<Mutex<Connection>>;

pub(crate) fn lock(
    connection: &SharedSqliteConnection,
) -> Result<MutexGuard<'_, Connection>, JobsiteError> {
    connection.lock().map_err(|_| JobsiteError::LockPoisoned)
}

/// Creates the entire database schema by running schema creation functions for all entities.
/// Parents are created before the tables referencing them.
pub(crate) fn create_schema(connection: &SharedSqliteConnection) -> Result<(), JobsiteError> {
    {
        let conn = lock(connection)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    }
    sqlite_company_repo::create_company_tables(connection)?;
    sqlite_project_repo::create_project_table(connection)?;
    sqlite_subcontractor_repo::create_subcontractor_tables(connection)?;
    sqlite_contractor_repo::create_contractor_table(connection)?;
    sqlite_timesheet_repo::create_timesheet_table(connection)?;
    sqlite_submission_repo::create_submission_table(connection)?;
    sqlite_document_repo::create_document_table(connection)?;
    sqlite_toolbox_talk_repo::create_toolbox_talk_table(connection)?;
    Ok(())
}

pub(crate) fn create_connection(dbms_path: &Path) -> Result<Connection, JobsiteError> {
    if let Some(parent) = dbms_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Connection::open(dbms_path).map_err(|e| JobsiteError::OpenDbms {
        path: dbms_path.to_string_lossy().to_string(),
        reason: e.to_string(),
    })
}

/// Assembles the `WHERE` clause of a list query together with its positional parameters.
///
/// Every query starts out scoped to a single company.
pub(crate) struct QueryConditions {
    clauses: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl QueryConditions {
    pub(crate) fn for_company(company_id: i64) -> Self {
        let mut conditions = QueryConditions {
            clauses: Vec::new(),
            params: Vec::new(),
        };
        conditions.push("company_id = ?", company_id);
        conditions
    }

    pub(crate) fn push<T: ToSql + 'static>(&mut self, clause: &str, value: T) {
        self.clauses.push(clause.to_string());
        self.params.push(Box::new(value));
    }

    pub(crate) fn push_opt<T: ToSql + 'static>(&mut self, clause: &str, value: Option<T>) {
        if let Some(value) = value {
            self.push(clause, value);
        }
    }

    /// Adds a clause with one placeholder per value, e.g. `id IN (?, ?, ?)`
    pub(crate) fn push_all<T: ToSql + Clone + 'static>(&mut self, clause: &str, values: &[T]) {
        self.clauses.push(clause.to_string());
        for value in values {
            self.params.push(Box::new(value.clone()));
        }
    }

    /// Adds a case-insensitive substring match over `columns`, OR-ed together.
    /// Blank search terms add nothing.
    pub(crate) fn push_search(&mut self, columns: &[&str], term: Option<&str>) {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return;
        };
        let pattern = format!("%{}%", term.to_lowercase());
        let clause = columns
            .iter()
            .map(|column| format!("lower(coalesce({column}, '')) LIKE ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.clauses.push(format!("({clause})"));
        for _ in columns {
            self.params.push(Box::new(pattern.clone()));
        }
    }

    pub(crate) fn where_clause(&self) -> String {
        format!(" WHERE {}", self.clauses.join(" AND "))
    }

    pub(crate) fn params(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(AsRef::as_ref).collect()
    }

    /// Runs `select count(*)` against `table` with these conditions
    pub(crate) fn count(&self, conn: &Connection, table: &str) -> Result<i64, JobsiteError> {
        let sql = format!("SELECT count(*) FROM {table}{}", self.where_clause());
        let count = conn.query_row(&sql, self.params().as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    /// Runs `select` with these conditions, ordered by `order_by` and limited to one page
    pub(crate) fn select_page<T, F>(
        &self,
        conn: &Connection,
        select: &str,
        order_by: &str,
        page: &PageRequest,
        map_row: F,
    ) -> Result<Vec<T>, JobsiteError>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let sql = format!(
            "{select}{} ORDER BY {order_by} LIMIT ? OFFSET ?",
            self.where_clause()
        );
        let limit = page.limit();
        let offset = page.offset();
        let mut params = self.params();
        params.push(&limit);
        params.push(&offset);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params.as_slice(), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Like `select_page`, without the limit
    pub(crate) fn select_all<T, F>(
        &self,
        conn: &Connection,
        select: &str,
        order_by: &str,
        map_row: F,
    ) -> Result<Vec<T>, JobsiteError>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let sql = format!("{select}{} ORDER BY {order_by}", self.where_clause());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(self.params().as_slice(), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests;
