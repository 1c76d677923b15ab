mod schema_tests;

use super::*;
use crate::repository::company_repository::CompanyRepository;
use crate::repository::database_manager::{DatabaseConfig, DatabaseManager};
use crate::types::{Admin, Company, MembershipTier};

/// Creates a `DatabaseManager` with an in-memory database suitable for testing.
pub fn test_database_manager() -> Result<DatabaseManager, JobsiteError> {
    DatabaseManager::new(&DatabaseConfig::SqliteInMemory)
}

/// Creates a company on the given tier together with one admin
pub fn create_company_for_test(
    db_manager: &DatabaseManager,
    tier: MembershipTier,
) -> Result<(Company, Admin), JobsiteError> {
    let company_repo = db_manager.create_company_repository();
    let company = company_repo.create_company("Acme Builders", tier)?;
    let admin = company_repo.create_admin(
        company.id,
        &format!("admin{}@acme.example", company.id),
        "Site Admin",
    )?;
    Ok((company, admin))
}
