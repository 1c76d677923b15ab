//! The `/api` routes. Handlers authenticate the caller, decode the request and
//! hand it to the matching service of the `ApplicationRuntime`.
use axum::Router;
use jobsite::error::JobsiteError;
use jobsite::ApplicationRuntime;
use std::sync::Arc;

pub mod error;
pub mod extract;
pub mod response;

mod company;
mod contractors;
mod incidents;
mod payroll;
mod projects;
mod subcontractors;
mod submissions;
mod timesheets;
mod toolbox_talks;
mod uploads;

use error::ApiError;

pub type SharedState = Arc<ApplicationRuntime>;

pub fn router() -> Router<SharedState> {
    Router::new()
        .merge(company::routes())
        .merge(projects::routes())
        .merge(subcontractors::routes())
        .merge(contractors::routes())
        .merge(timesheets::routes())
        .merge(submissions::routes())
        .merge(incidents::routes())
        .merge(uploads::routes())
        .merge(toolbox_talks::routes())
        .merge(payroll::routes())
}

/// Runs a service call on the blocking thread pool, services hold the database lock
pub(crate) async fn call<F, R>(state: &SharedState, f: F) -> Result<R, ApiError>
where
    F: FnOnce(&ApplicationRuntime) -> Result<R, JobsiteError> + Send + 'static,
    R: Send + 'static,
{
    let runtime = state.clone();
    tokio::task::spawn_blocking(move || f(&runtime))
        .await
        .map_err(|e| ApiError::Internal(format!("Service task failed: {e}")))?
        .map_err(ApiError::from)
}
