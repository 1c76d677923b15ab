use super::error::ApiError;
use super::extract::Auth;
use super::response::ok;
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

pub(super) fn routes() -> Router<SharedState> {
    Router::new().route("/api/company", get(overview))
}

async fn overview(
    State(state): State<SharedState>,
    Auth(principal): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let overview = call(&state, move |rt| rt.company_service().overview(&principal)).await?;
    Ok(ok(overview))
}
