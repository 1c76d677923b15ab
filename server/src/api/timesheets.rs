use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery, Auth, PageQuery};
use super::response::{created, ok, paginated, Deleted};
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::Router;
use chrono::NaiveDate;
use jobsite::repository::timesheet_repository::TimesheetFilter;
use jobsite::service::timesheet_service::StatusChange;
use jobsite::types::{TimesheetInput, TimesheetStatus};
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/timesheets", get(list).post(create))
        .route("/api/timesheets/summary", get(summary))
        .route(
            "/api/timesheets/{id}",
            get(fetch).put(update).delete(remove),
        )
        .route("/api/timesheets/{id}/status", patch(review))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimesheetQuery {
    status: Option<TimesheetStatus>,
    project_id: Option<i64>,
    contractor_id: Option<i64>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangeQuery {
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

async fn list(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiQuery(paging): ApiQuery<PageQuery>,
    ApiQuery(query): ApiQuery<TimesheetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TimesheetFilter {
        status: query.status,
        project_id: query.project_id,
        contractor_id: query.contractor_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let page = call(&state, move |rt| {
        rt.timesheet_service()
            .list(&principal, &filter, &paging.request())
    })
    .await?;
    Ok(paginated(page))
}

async fn create(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(input): ApiJson<TimesheetInput>,
) -> Result<impl IntoResponse, ApiError> {
    let timesheet = call(&state, move |rt| {
        rt.timesheet_service().create(&principal, &input)
    })
    .await?;
    Ok(created(timesheet))
}

async fn summary(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiQuery(range): ApiQuery<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = call(&state, move |rt| {
        rt.timesheet_service()
            .summary(&principal, range.date_from, range.date_to)
    })
    .await?;
    Ok(ok(summary))
}

async fn fetch(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let timesheet = call(&state, move |rt| rt.timesheet_service().get(&principal, id)).await?;
    Ok(ok(timesheet))
}

async fn update(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<TimesheetInput>,
) -> Result<impl IntoResponse, ApiError> {
    let timesheet = call(&state, move |rt| {
        rt.timesheet_service().update(&principal, id, &input)
    })
    .await?;
    Ok(ok(timesheet))
}

async fn remove(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    call(&state, move |rt| rt.timesheet_service().delete(&principal, id)).await?;
    Ok(ok(Deleted { id }))
}

async fn review(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<impl IntoResponse, ApiError> {
    let timesheet = call(&state, move |rt| {
        rt.timesheet_service().review(&principal, id, &change)
    })
    .await?;
    Ok(ok(timesheet))
}
