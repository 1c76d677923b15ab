use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery, Auth, PageQuery};
use super::response::{created, ok, paginated, Deleted};
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use jobsite::types::ToolboxTalkInput;
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/toolbox-talks", get(list).post(create))
        .route(
            "/api/toolbox-talks/{id}",
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
        rt.toolbox_talk_service()
            .list(&principal, query.search.as_deref(), &paging.request())
    })
    .await?;
    Ok(paginated(page))
}

async fn create(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(input): ApiJson<ToolboxTalkInput>,
) -> Result<impl IntoResponse, ApiError> {
    let talk = call(&state, move |rt| {
        rt.toolbox_talk_service().create(&principal, &input)
    })
    .await?;
    Ok(created(talk))
}

async fn fetch(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let talk = call(&state, move |rt| rt.toolbox_talk_service().get(&principal, id)).await?;
    Ok(ok(talk))
}

async fn update(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ToolboxTalkInput>,
) -> Result<impl IntoResponse, ApiError> {
    let talk = call(&state, move |rt| {
        rt.toolbox_talk_service().update(&principal, id, &input)
    })
    .await?;
    Ok(ok(talk))
}

async fn remove(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    call(&state, move |rt| rt.toolbox_talk_service().delete(&principal, id)).await?;
    Ok(ok(Deleted { id }))
}
