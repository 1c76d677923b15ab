use crate::error::JobsiteError;
use crate::repository::sqlite;
use crate::repository::sqlite::sqlite_company_repo::SqliteCompanyRepository;
use crate::repository::sqlite::sqlite_contractor_repo::SqliteContractorRepository;
use crate::repository::sqlite::sqlite_document_repo::SqliteDocumentRepository;
use crate::repository::sqlite::sqlite_project_repo::SqliteProjectRepository;
use crate::repository::sqlite::sqlite_subcontractor_repo::SqliteSubcontractorRepository;
use crate::repository::sqlite::sqlite_submission_repo::SqliteSubmissionRepository;
use crate::repository::sqlite::sqlite_timesheet_repo::SqliteTimesheetRepository;
use crate::repository::sqlite::sqlite_toolbox_talk_repo::SqliteToolboxTalkRepository;
use crate::repository::sqlite::SharedSqliteConnection;
use log::debug;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Represents parameters for initializing the database connection
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseConfig {
    /// SQLite database with a specific file path
    SqliteOnDisk { path: PathBuf },

    /// SQLite database that runs entirely in memory
    SqliteInMemory,
}

pub struct DatabaseManager {
    connection: SharedSqliteConnection,
}

impl DatabaseManager {
    /// Opens the database described by `config` and creates the schema if needed.
    ///
    /// # Errors
    /// Returns an error if the database can not be opened or the schema can not be created.
    pub fn new(config: &DatabaseConfig) -> Result<Self, JobsiteError> {
        let connection = match config {
            DatabaseConfig::SqliteOnDisk { path } => {
                debug!("Opening sqlite database {}", path.display());
                sqlite::create_connection(path)?
            }
            DatabaseConfig::SqliteInMemory => Connection::open_in_memory()?,
        };

        let connection = Arc::new(Mutex::new(connection));
        sqlite::create_schema(&connection)?;

        Ok(Self { connection })
    }

    /// Provide access to the shared database connection.
    pub(crate) fn get_connection(&self) -> SharedSqliteConnection {
        self.connection.clone()
    }

    pub(crate) fn create_company_repository(&self) -> Arc<SqliteCompanyRepository> {
        Arc::new(SqliteCompanyRepository::new(self.get_connection()))
    }

    pub(crate) fn create_project_repository(&self) -> Arc<SqliteProjectRepository> {
        Arc::new(SqliteProjectRepository::new(self.get_connection()))
    }

    pub(crate) fn create_subcontractor_repository(&self) -> Arc<SqliteSubcontractorRepository> {
        Arc::new(SqliteSubcontractorRepository::new(self.get_connection()))
    }

    pub(crate) fn create_contractor_repository(&self) -> Arc<SqliteContractorRepository> {
        Arc::new(SqliteContractorRepository::new(self.get_connection()))
    }

    pub(crate) fn create_timesheet_repository(&self) -> Arc<SqliteTimesheetRepository> {
        Arc::new(SqliteTimesheetRepository::new(self.get_connection()))
    }

    pub(crate) fn create_submission_repository(&self) -> Arc<SqliteSubmissionRepository> {
        Arc::new(SqliteSubmissionRepository::new(self.get_connection()))
    }

    pub(crate) fn create_document_repository(&self) -> Arc<SqliteDocumentRepository> {
        Arc::new(SqliteDocumentRepository::new(self.get_connection()))
    }

    pub(crate) fn create_toolbox_talk_repository(&self) -> Arc<SqliteToolboxTalkRepository> {
        Arc::new(SqliteToolboxTalkRepository::new(self.get_connection()))
    }
}
