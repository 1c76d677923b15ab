use crate::error::JobsiteError;
use crate::types::{Admin, Company, MembershipTier};

/// Companies are the tenants of the system, admins belong to exactly one company.
#[cfg_attr(test, mockall::automock)]
pub trait CompanyRepository: Send + Sync {
    /// Inserts a new company and returns it with its assigned id.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn create_company(&self, name: &str, tier: MembershipTier) -> Result<Company, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_company(&self, company_id: i64) -> Result<Option<Company>, JobsiteError>;

    /// Changes the membership tier of a company.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the update fails.
    fn update_tier(&self, company_id: i64, tier: MembershipTier) -> Result<bool, JobsiteError>;

    /// Inserts an admin for the company. The email address is unique across all companies.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the insert fails.
    fn create_admin(&self, company_id: i64, email: &str, name: &str)
        -> Result<Admin, JobsiteError>;

    /// Finds an admin within the given company.
    ///
    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_admin(&self, company_id: i64, admin_id: i64) -> Result<Option<Admin>, JobsiteError>;

    /// # Errors
    /// Returns `JobsiteError::Sql` if the query fails.
    fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, JobsiteError>;
}
