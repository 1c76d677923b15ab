use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery, Auth, PageQuery};
use super::response::{created, ok, paginated};
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use jobsite::repository::contractor_repository::ContractorFilter;
use jobsite::service::contractor_service::ContractorRemoval;
use jobsite::types::ContractorInput;
use serde::{Deserialize, Serialize};

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/contractors", get(list).post(create))
        .route(
            "/api/contractors/{id}",
            get(fetch).put(update).delete(remove),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractorQuery {
    search: Option<String>,
    active: Option<bool>,
    subcontractor_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct Removed {
    id: i64,
    result: ContractorRemoval,
}

async fn list(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiQuery(paging): ApiQuery<PageQuery>,
    ApiQuery(query): ApiQuery<ContractorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ContractorFilter {
        search: query.search,
        active: query.active,
        subcontractor_id: query.subcontractor_id,
    };
    let page = call(&state, move |rt| {
        rt.contractor_service()
            .list(&principal, &filter, &paging.request())
    })
    .await?;
    Ok(paginated(page))
}

async fn create(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(input): ApiJson<ContractorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let contractor = call(&state, move |rt| {
        rt.contractor_service().create(&principal, &input)
    })
    .await?;
    Ok(created(contractor))
}

async fn fetch(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let contractor = call(&state, move |rt| rt.contractor_service().get(&principal, id)).await?;
    Ok(ok(contractor))
}

async fn update(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ContractorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let contractor = call(&state, move |rt| {
        rt.contractor_service().update(&principal, id, &input)
    })
    .await?;
    Ok(ok(contractor))
}

async fn remove(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let result = call(&state, move |rt| rt.contractor_service().delete(&principal, id)).await?;
    Ok(ok(Removed { id, result }))
}
