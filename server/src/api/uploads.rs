use super::error::ApiError;
use super::extract::{ApiJson, Auth};
use super::response::created;
use super::SharedState;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use jobsite::error::JobsiteError;
use serde::{Deserialize, Serialize};

pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/uploads", post(upload))
        .route("/api/uploads/signature", post(upload_signature))
}

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureRequest {
    data_url: String,
}

#[derive(Debug, Serialize)]
struct SignatureResponse {
    url: String,
}

async fn upload(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        let stored = state
            .upload_service()
            .upload(
                &principal,
                file_name.as_deref(),
                content_type.as_deref(),
                &bytes,
            )
            .await?;
        return Ok(created(stored));
    }
    Err(JobsiteError::BadInput(format!("Missing multipart field '{FILE_FIELD}'")).into())
}

async fn upload_signature(
    State(state): State<SharedState>,
    Auth(principal): Auth,
    ApiJson(request): ApiJson<SignatureRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let stored = state
        .upload_service()
        .upload_signature(&principal, &request.data_url)
        .await?;
    Ok(created(SignatureResponse { url: stored.url }))
}
