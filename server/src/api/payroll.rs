use super::error::ApiError;
use super::extract::{ApiJson, Auth};
use super::response::ok;
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use jobsite::payroll::PayrollRequest;

pub(super) fn routes() -> Router<SharedState> {
    Router::new().route(
        "/api/admin/certified-payroll/calculate-multi-week",
        post(calculate_multi_week),
    )
}

async fn calculate_multi_week(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(request): ApiJson<PayrollRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = call(&state, move |rt| {
        rt.payroll_service()
            .calculate_multi_week(&principal, &request)
    })
    .await?;
    Ok(ok(report))
}
