// Application repository modules, each representing specific database entity operations.
pub mod company_repository;
pub mod contractor_repository;
pub mod document_repository;
pub mod project_repository;
pub mod subcontractor_repository;
pub mod submission_repository;
pub mod timesheet_repository;
pub mod toolbox_talk_repository;

// Database-related utilities and managers.
pub mod database_manager;
pub(crate) mod sqlite;
