use std::fmt::{self, Formatter};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use jobsite::types::MembershipTier;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser, Debug)]
/// Jobsite server - safety forms, timesheets and certified payroll for construction companies
///
/// Configuration is read from a TOML file, create one with `jobsite-server init-config`.
#[command(author, version, about)]
pub struct Opts {
    #[command(subcommand)]
    pub cmd: Command,

    /// Configuration file to use instead of the default location
    #[arg(global = true, short, long)]
    pub config: Option<PathBuf>,

    #[arg(global = true, short, long)]
    pub log_level: Option<LogLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve,
    /// Write a configuration file with a freshly generated signing secret
    InitConfig(InitConfig),
    /// Create a company together with its first admin
    Bootstrap(Bootstrap),
    /// Move a company to another membership tier
    Tier(ChangeTier),
    /// Mint an access token for an existing admin or contractor
    Token(Token),
}

#[derive(Args, Debug)]
pub struct InitConfig {
    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Tier {
    Basic,
    Professional,
    Enterprise,
}

impl From<Tier> for MembershipTier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Basic => MembershipTier::Basic,
            Tier::Professional => MembershipTier::Professional,
            Tier::Enterprise => MembershipTier::Enterprise,
        }
    }
}

#[derive(Args, Debug)]
pub struct Bootstrap {
    /// Name of the company
    #[arg(long)]
    pub company: String,
    #[arg(long, value_enum, default_value_t = Tier::Basic)]
    pub tier: Tier,
    #[arg(long)]
    pub admin_email: String,
    #[arg(long)]
    pub admin_name: String,
}

#[derive(Args, Debug)]
pub struct ChangeTier {
    #[arg(long)]
    pub company_id: i64,
    #[arg(long, value_enum)]
    pub tier: Tier,
}

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenRole {
    Admin,
    Contractor,
}

#[derive(Args, Debug)]
pub struct Token {
    #[arg(long, value_enum)]
    pub role: TokenRole,
    /// Id of the admin or contractor
    #[arg(long)]
    pub id: i64,
    #[arg(long)]
    pub company_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bootstrap() {
        let opts = Opts::parse_from([
            "jobsite-server",
            "bootstrap",
            "--company",
            "Acme",
            "--tier",
            "professional",
            "--admin-email",
            "boss@acme.example",
            "--admin-name",
            "Boss",
        ]);
        match opts.cmd {
            Command::Bootstrap(bootstrap) => {
                assert_eq!(bootstrap.company, "Acme");
                assert_eq!(MembershipTier::from(bootstrap.tier), MembershipTier::Professional);
            }
            other => panic!("Unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_tier() {
        let opts = Opts::parse_from([
            "jobsite-server",
            "tier",
            "--company-id",
            "4",
            "--tier",
            "enterprise",
        ]);
        match opts.cmd {
            Command::Tier(change) => {
                assert_eq!(change.company_id, 4);
                assert_eq!(MembershipTier::from(change.tier), MembershipTier::Enterprise);
            }
            other => panic!("Unexpected command {other:?}"),
        }
        assert!(Opts::try_parse_from(["jobsite-server", "tier", "--company-id", "4"]).is_err());
    }

    #[test]
    fn test_global_options() {
        let opts = Opts::parse_from([
            "jobsite-server",
            "serve",
            "--config",
            "/tmp/jobsite.toml",
            "--log-level",
            "debug",
        ]);
        assert!(matches!(opts.cmd, Command::Serve));
        assert_eq!(opts.config, Some(PathBuf::from("/tmp/jobsite.toml")));
        assert_eq!(opts.log_level, Some(LogLevel::Debug));
    }
}
