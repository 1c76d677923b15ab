use jobsite::auth::Principal;
use jobsite::config::AppConfiguration;
use jobsite::error::JobsiteError;
use jobsite::types::MembershipTier;
use jobsite::{ApplicationRuntime, ApplicationRuntimeBuilder};
use tempfile::TempDir;

/// A runtime with an in-memory database, uploads go to a temporary directory
/// removed when the context is dropped
pub struct TestContext {
    pub runtime: ApplicationRuntime,
    _upload_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Result<Self, JobsiteError> {
        let _ = env_logger::builder().is_test(true).try_init();
        let upload_dir = tempfile::tempdir()?;
        let mut config = AppConfiguration::generate();
        config.storage.upload_dir = upload_dir.path().to_string_lossy().to_string();

        let runtime = ApplicationRuntimeBuilder::new()
            .use_in_memory_db()
            .with_configuration(config)
            .build()?;
        Ok(TestContext {
            runtime,
            _upload_dir: upload_dir,
        })
    }

    /// Bootstraps a company and returns the principal of its first admin
    pub fn create_company(&self, name: &str, tier: MembershipTier) -> Result<Principal, JobsiteError> {
        let email = format!("admin@{}.example", name.to_lowercase().replace(' ', "-"));
        let (company, admin) = self
            .runtime
            .company_service()
            .bootstrap(name, tier, &email, "Admin")?;
        Ok(Principal::Admin {
            admin_id: admin.id,
            company_id: company.id,
        })
    }
}
