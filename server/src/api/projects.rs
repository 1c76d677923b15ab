use super::error::ApiError;
use super::extract::{ApiJson, ApiPath, ApiQuery, Auth, PageQuery};
use super::response::{created, ok, paginated, Deleted};
use super::{call, SharedState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::Router;
use jobsite::repository::project_repository::ProjectFilter;
use jobsite::types::{DocumentInput, ProjectInput, ProjectStatus};
use log::warn;
use serde::Deserialize;

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/projects", get(list).post(create))
        .route("/api/projects/{id}", get(fetch).put(update).delete(remove))
        .route(
            "/api/projects/{id}/subcontractors",
            get(list_subcontractors).post(attach_subcontractor),
        )
        .route(
            "/api/projects/{id}/subcontractors/{sub_id}",
            delete(detach_subcontractor),
        )
        .route(
            "/api/projects/{id}/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/api/projects/{id}/documents/{doc_id}",
            delete(delete_document),
        )
}

#[derive(Debug, Default, Deserialize)]
struct ProjectQuery {
    search: Option<String>,
    status: Option<ProjectStatus>,
}

async fn list(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiQuery(paging): ApiQuery<PageQuery>,
    ApiQuery(query): ApiQuery<ProjectQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ProjectFilter {
        search: query.search,
        status: query.status,
    };
    let page = call(&state, move |rt| {
        rt.project_service()
            .list(&principal, &filter, &paging.request())
    })
    .await?;
    Ok(paginated(page))
}

async fn create(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<impl IntoResponse, ApiError> {
    let project = call(&state, move |rt| rt.project_service().create(&principal, &input)).await?;
    Ok(created(project))
}

async fn fetch(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = call(&state, move |rt| rt.project_service().get(&principal, id)).await?;
    Ok(ok(project))
}

async fn update(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ProjectInput>,
) -> Result<impl IntoResponse, ApiError> {
    let project = call(&state, move |rt| {
        rt.project_service().update(&principal, id, &input)
    })
    .await?;
    Ok(ok(project))
}

async fn remove(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    call(&state, move |rt| rt.project_service().delete(&principal, id)).await?;
    Ok(ok(Deleted { id }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttachSubcontractor {
    subcontractor_id: i64,
}

async fn list_subcontractors(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let linked = call(&state, move |rt| {
        rt.subcontractor_service().for_project(&principal, id)
    })
    .await?;
    Ok(ok(linked))
}

async fn attach_subcontractor(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<AttachSubcontractor>,
) -> Result<impl IntoResponse, ApiError> {
    let linked = call(&state, move |rt| {
        rt.subcontractor_service()
            .attach(&principal, id, body.subcontractor_id)
    })
    .await?;
    Ok(created(linked))
}

async fn detach_subcontractor(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath((id, sub_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    call(&state, move |rt| {
        rt.subcontractor_service().detach(&principal, id, sub_id)
    })
    .await?;
    Ok(ok(Deleted { id: sub_id }))
}

#[derive(Debug, Default, Deserialize)]
struct DocumentQuery {
    category: Option<String>,
}

async fn list_documents(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(paging): ApiQuery<PageQuery>,
    ApiQuery(query): ApiQuery<DocumentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = call(&state, move |rt| {
        rt.document_service().list(
            &principal,
            id,
            query.category.as_deref(),
            &paging.request(),
        )
    })
    .await?;
    Ok(paginated(page))
}

async fn create_document(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<DocumentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let document = call(&state, move |rt| {
        rt.document_service().create(&principal, id, &input)
    })
    .await?;
    Ok(created(document))
}

async fn delete_document(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiPath((id, doc_id)): ApiPath<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let document = call(&state, move |rt| {
        rt.document_service().delete(&principal, id, doc_id)
    })
    .await?;
    // The document row is already deleted, a failed file removal is only logged
    if let Err(e) = state.upload_service().remove(&principal, &document.url).await {
        warn!("Unable to remove the file of document {doc_id}: {e}");
    }
    Ok(ok(Deleted { id: doc_id }))
}
