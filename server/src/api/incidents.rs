use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery, Auth, PageQuery};
use super::response::{ok, paginated};
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use jobsite::types::SubmissionStatus;
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/incidents", get(list))
        .route("/api/incidents/{id}", get(fetch).patch(update_status))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncidentQuery {
    status: Option<SubmissionStatus>,
    project_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct IncidentStatusChange {
    status: SubmissionStatus,
}

async fn list(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiQuery(paging): ApiQuery<PageQuery>,
    ApiQuery(query): ApiQuery<IncidentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = call(&state, move |rt| {
        rt.submission_service().list_incidents(
            &principal,
            query.status,
            query.project_id,
            &paging.request(),
        )
    })
    .await?;
    Ok(paginated(page))
}

async fn fetch(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let incident = call(&state, move |rt| {
        rt.submission_service().get_incident(&principal, id)
    })
    .await?;
    Ok(ok(incident))
}

async fn update_status(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<IncidentStatusChange>,
) -> Result<impl IntoResponse, ApiError> {
    let incident = call(&state, move |rt| {
        rt.submission_service()
            .update_incident_status(&principal, id, change.status)
    })
    .await?;
    Ok(ok(incident))
}
