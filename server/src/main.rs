//! # The Jobsite server
//!
//! Serves the `/api` of the jobsite administration backend and the small set of
//! commands needed to operate it.
//!
//! ```bash
//! jobsite-server init-config
//! jobsite-server bootstrap --company "Acme Builders" --admin-email boss@acme.example --admin-name Boss
//! jobsite-server tier --company-id 1 --tier professional
//! jobsite-server token --role admin --id 1 --company-id 1
//! jobsite-server serve --log-level debug
//! ```
use clap::Parser;
use env_logger::Env;
use jobsite::auth::Role;
use jobsite::config::{self, AppConfiguration};
use jobsite::error::JobsiteError;
use jobsite::types::MembershipTier;
use jobsite::{ApplicationRuntime, ApplicationRuntimeBuilder};
use jobsite_server::cli::{Bootstrap, ChangeTier, Command, InitConfig, LogLevel, Opts, Token, TokenRole};
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

#[derive(Error, Debug)]
enum ServerError {
    #[error(transparent)]
    Jobsite(#[from] JobsiteError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Config(#[from] anyhow::Error),
    #[error("Configuration file {0} already exists, use --force to replace it")]
    ConfigExists(PathBuf),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let opts = Opts::parse();
    configure_logging(opts.log_level);

    match opts.cmd {
        Command::Serve => serve(opts.config).await,
        Command::InitConfig(init) => init_config(opts.config, &init),
        Command::Bootstrap(bootstrap) => create_company(opts.config, &bootstrap),
        Command::Tier(change) => change_tier(opts.config, &change),
        Command::Token(token) => mint_token(opts.config, &token),
    }
}

fn configure_logging(level: Option<LogLevel>) {
    let default_level = level.map_or_else(|| "info".to_string(), |lvl| lvl.to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
    debug!("Logging started");
}

fn runtime(config_path: Option<PathBuf>) -> Result<ApplicationRuntime, ServerError> {
    let mut builder = ApplicationRuntimeBuilder::new();
    if let Some(path) = config_path {
        builder = builder.with_config_path(path);
    }
    builder.build().map_err(|err| {
        if let JobsiteError::ApplicationConfig { path, .. } = &err {
            eprintln!(
                "Configuration file {} not found. Use 'jobsite-server init-config' to create it",
                path.display()
            );
        }
        err.into()
    })
}

async fn serve(config_path: Option<PathBuf>) -> Result<(), ServerError> {
    let runtime = Arc::new(runtime(config_path)?);
    let addr = runtime.config().bind_address()?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = jobsite_server::app(runtime).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on {addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for the shutdown signal: {e}");
    }
}

fn init_config(config_path: Option<PathBuf>, init: &InitConfig) -> Result<(), ServerError> {
    let path = config_path.unwrap_or_else(config::configuration_file);
    if path.exists() && !init.force {
        return Err(ServerError::ConfigExists(path));
    }
    config::save(&AppConfiguration::generate(), &path)?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn create_company(config_path: Option<PathBuf>, bootstrap: &Bootstrap) -> Result<(), ServerError> {
    let runtime = runtime(config_path)?;
    let (company, admin) = runtime.company_service().bootstrap(
        &bootstrap.company,
        bootstrap.tier.into(),
        &bootstrap.admin_email,
        &bootstrap.admin_name,
    )?;
    println!(
        "Created company {} '{}' on the {} tier with admin {} ({})",
        company.id, company.name, company.tier, admin.id, admin.email
    );
    println!(
        "To get a token: jobsite-server token --role admin --id {} --company-id {}",
        admin.id, company.id
    );
    Ok(())
}

fn change_tier(config_path: Option<PathBuf>, change: &ChangeTier) -> Result<(), ServerError> {
    let runtime = runtime(config_path)?;
    let tier = MembershipTier::from(change.tier);
    runtime.company_service().change_tier(change.company_id, tier)?;
    println!("Company {} is now on the {tier} tier", change.company_id);
    Ok(())
}

fn mint_token(config_path: Option<PathBuf>, token: &Token) -> Result<(), ServerError> {
    let runtime = runtime(config_path)?;
    let role = match token.role {
        TokenRole::Admin => Role::Admin,
        TokenRole::Contractor => Role::Contractor,
    };
    let signed = runtime
        .authenticator()
        .issue_for(role, token.id, token.company_id)?;
    println!("{signed}");
    Ok(())
}
