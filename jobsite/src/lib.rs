use crate::auth::{Authenticator, TokenSigner};
use crate::blob::{BlobStore, FileSystemBlobStore};
use crate::error::JobsiteError;
use crate::repository::database_manager::{DatabaseConfig, DatabaseManager};
use crate::service::company_service::CompanyService;
use crate::service::contractor_service::ContractorService;
use crate::service::document_service::DocumentService;
use crate::service::payroll_service::PayrollService;
use crate::service::project_service::ProjectService;
use crate::service::subcontractor_service::SubcontractorService;
use crate::service::submission_service::SubmissionService;
use crate::service::timesheet_service::TimesheetService;
use crate::service::toolbox_talk_service::ToolboxTalkService;
use crate::service::upload_service::UploadService;
use config::AppConfiguration;
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;

pub mod auth;
pub mod blob;
pub mod config;
pub mod date;
pub mod error;
pub mod pagination;
pub mod payroll;
pub mod repository;
pub mod service;
pub mod types;

/// Everything a request needs: the configuration, the authenticator and one
/// service per resource, all sharing a single database connection.
pub struct ApplicationRuntime {
    config: AppConfiguration,
    authenticator: Authenticator,
    company_service: CompanyService,
    project_service: ProjectService,
    subcontractor_service: SubcontractorService,
    contractor_service: ContractorService,
    timesheet_service: TimesheetService,
    submission_service: SubmissionService,
    document_service: DocumentService,
    toolbox_talk_service: ToolboxTalkService,
    payroll_service: PayrollService,
    upload_service: UploadService,
}

impl ApplicationRuntime {
    /// Creates the runtime from the configuration file at its default location
    ///
    /// # Errors
    /// Returns an error if the configuration can not be loaded or the database
    /// can not be opened
    pub fn new() -> Result<Self, JobsiteError> {
        ApplicationRuntimeBuilder::new().build()
    }

    pub fn config(&self) -> &AppConfiguration {
        &self.config
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn company_service(&self) -> &CompanyService {
        &self.company_service
    }

    pub fn project_service(&self) -> &ProjectService {
        &self.project_service
    }

    pub fn subcontractor_service(&self) -> &SubcontractorService {
        &self.subcontractor_service
    }

    pub fn contractor_service(&self) -> &ContractorService {
        &self.contractor_service
    }

    pub fn timesheet_service(&self) -> &TimesheetService {
        &self.timesheet_service
    }

    pub fn submission_service(&self) -> &SubmissionService {
        &self.submission_service
    }

    pub fn document_service(&self) -> &DocumentService {
        &self.document_service
    }

    pub fn toolbox_talk_service(&self) -> &ToolboxTalkService {
        &self.toolbox_talk_service
    }

    pub fn payroll_service(&self) -> &PayrollService {
        &self.payroll_service
    }

    pub fn upload_service(&self) -> &UploadService {
        &self.upload_service
    }
}

#[derive(Default)]
pub struct ApplicationRuntimeBuilder {
    configuration: Option<AppConfiguration>,
    in_memory_db: bool,
    config_path: Option<PathBuf>,
}

impl ApplicationRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps all data in memory, used by the tests
    #[must_use]
    pub fn use_in_memory_db(mut self) -> Self {
        self.in_memory_db = true;
        self
    }

    /// Uses the supplied configuration instead of reading the configuration file
    #[must_use]
    pub fn with_configuration(mut self, configuration: AppConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Reads the configuration from `path` instead of the default location
    #[must_use]
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// # Errors
    /// Returns an error if the configuration is invalid or the database or the
    /// upload directory can not be set up
    pub fn build(self) -> Result<ApplicationRuntime, JobsiteError> {
        let config = match self.configuration {
            Some(configuration) => {
                configuration.validate()?;
                configuration
            }
            None => config::load(self.config_path.as_deref())?,
        };

        let db_config = if self.in_memory_db {
            DatabaseConfig::SqliteInMemory
        } else {
            DatabaseConfig::SqliteOnDisk {
                path: PathBuf::from(&config.database.path),
            }
        };
        debug!("Using database {db_config:?}");
        let db_manager = DatabaseManager::new(&db_config)?;

        let company_repo = db_manager.create_company_repository();
        let project_repo = db_manager.create_project_repository();
        let subcontractor_repo = db_manager.create_subcontractor_repository();
        let contractor_repo = db_manager.create_contractor_repository();
        let timesheet_repo = db_manager.create_timesheet_repository();

        let signer = TokenSigner::new(&config.auth.jwt_secret, config.auth.token_ttl_hours);
        let authenticator =
            Authenticator::new(signer, company_repo.clone(), contractor_repo.clone());

        let upload_dir = PathBuf::from(&config.storage.upload_dir);
        std::fs::create_dir_all(&upload_dir)?;
        let store: Arc<dyn BlobStore> = Arc::new(FileSystemBlobStore::new(
            &upload_dir,
            &config.storage.public_base_url,
        )?);

        let runtime = ApplicationRuntime {
            authenticator,
            company_service: CompanyService::new(company_repo, project_repo.clone()),
            project_service: ProjectService::new(project_repo.clone()),
            subcontractor_service: SubcontractorService::new(
                subcontractor_repo.clone(),
                project_repo.clone(),
            ),
            contractor_service: ContractorService::new(
                contractor_repo.clone(),
                subcontractor_repo.clone(),
            ),
            timesheet_service: TimesheetService::new(
                timesheet_repo.clone(),
                project_repo.clone(),
                contractor_repo.clone(),
            ),
            submission_service: SubmissionService::new(
                db_manager.create_submission_repository(),
                project_repo.clone(),
            ),
            document_service: DocumentService::new(
                db_manager.create_document_repository(),
                project_repo.clone(),
            ),
            toolbox_talk_service: ToolboxTalkService::new(
                db_manager.create_toolbox_talk_repository(),
            ),
            payroll_service: PayrollService::new(
                project_repo,
                timesheet_repo,
                contractor_repo,
                subcontractor_repo,
            ),
            upload_service: UploadService::new(store, config.storage.max_upload_bytes),
            config,
        };
        info!("Application runtime ready");
        Ok(runtime)
    }
}
