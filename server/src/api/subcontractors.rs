use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery, Auth, PageQuery};
use super::response::{created, ok, paginated, Deleted};
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use jobsite::types::SubcontractorInput;
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/subcontractors", get(list).post(create))
        .route(
            "/api/subcontractors/{id}",
            get(fetch).put(update).delete(remove),
        )
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    search: Option<String>,
}

async fn list(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiQuery(paging): ApiQuery<PageQuery>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = call(&state, move |rt| {
        rt.subcontractor_service()
            .list(&principal, query.search.as_deref(), &paging.request())
    })
    .await?;
    Ok(paginated(page))
}

async fn create(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(input): ApiJson<SubcontractorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let subcontractor = call(&state, move |rt| {
        rt.subcontractor_service().create(&principal, &input)
    })
    .await?;
    Ok(created(subcontractor))
}

async fn fetch(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let subcontractor =
        call(&state, move |rt| rt.subcontractor_service().get(&principal, id)).await?;
    Ok(ok(subcontractor))
}

async fn update(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<SubcontractorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let subcontractor = call(&state, move |rt| {
        rt.subcontractor_service().update(&principal, id, &input)
    })
    .await?;
    Ok(ok(subcontractor))
}

async fn remove(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    call(&state, move |rt| rt.subcontractor_service().delete(&principal, id)).await?;
    Ok(ok(Deleted { id }))
}
