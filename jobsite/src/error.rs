use std::{io, path::PathBuf};

use thiserror::Error;
use url::ParseError;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum JobsiteError {
    #[error("Unable to load the application configuration file {path:?}")]
    ApplicationConfig { path: PathBuf, source: io::Error },
    #[error("Unable to parse contents of {path}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Unable to create configuration file {path}")]
    ConfigFileCreation { path: PathBuf },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unable to open DBMS in file {path}: {reason}")]
    OpenDbms { path: String, reason: String },
    #[error("SQL dbms error: {0}")]
    Sql(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Could not make sense of input: {0}")]
    BadInput(String),
    #[error("Unable to parse the url: {0}")]
    InvalidUrl(ParseError),
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("The {tier} membership allows at most {limit} projects")]
    ProjectLimitReached { tier: String, limit: u32 },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Upload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("Blob store failure: {0}")]
    BlobStore(String),
    #[error("Mutex locking error")]
    LockPoisoned,
}

impl JobsiteError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        JobsiteError::NotFound { entity, id }
    }
}

impl From<rusqlite::Error> for JobsiteError {
    fn from(err: rusqlite::Error) -> Self {
        JobsiteError::Sql(format!("Sqlite error {err}"))
    }
}

impl From<ParseError> for JobsiteError {
    fn from(value: ParseError) -> Self {
        JobsiteError::InvalidUrl(value)
    }
}

impl From<serde_json::Error> for JobsiteError {
    fn from(err: serde_json::Error) -> Self {
        JobsiteError::BadInput(format!("Invalid JSON: {err}"))
    }
}
