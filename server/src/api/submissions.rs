use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery, Auth, PageQuery};
use super::response::{created, ok, paginated, Deleted};
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use jobsite::repository::submission_repository::SubmissionFilter;
use jobsite::types::{SubmissionInput, SubmissionType};
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/submissions", get(list).post(create))
        .route("/api/submissions/{id}", get(fetch).delete(remove))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionQuery {
    #[serde(rename = "type")]
    submission_type: Option<SubmissionType>,
    project_id: Option<i64>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
}

async fn list(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiQuery(paging): ApiQuery<PageQuery>,
    ApiQuery(query): ApiQuery<SubmissionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = SubmissionFilter {
        submission_type: query.submission_type,
        project_id: query.project_id,
        date_from: query.date_from,
        date_to: query.date_to,
        ..Default::default()
    };
    let page = call(&state, move |rt| {
        rt.submission_service()
            .list(&principal, &filter, &paging.request())
    })
    .await?;
    Ok(paginated(page))
}

async fn create(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(input): ApiJson<SubmissionInput>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = call(&state, move |rt| {
        rt.submission_service().create(&principal, &input)
    })
    .await?;
    Ok(created(submission))
}

async fn fetch(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let submission = call(&state, move |rt| rt.submission_service().get(&principal, id)).await?;
    Ok(ok(submission))
}

async fn remove(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    call(&state, move |rt| rt.submission_service().delete(&principal, id)).await?;
    Ok(ok(Deleted { id }))
}
