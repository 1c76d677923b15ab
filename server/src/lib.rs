use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use jobsite::ApplicationRuntime;
use std::sync::Arc;
use tower_http::services::ServeDir;

pub mod api;
pub mod cli;

/// Room for the multipart boundaries and headers around an uploaded file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// The complete application: `/api`, the uploaded files below `/files` and `/health`
pub fn app(runtime: Arc<ApplicationRuntime>) -> Router {
    let upload_dir = runtime.config().storage.upload_dir.clone();
    let body_limit = runtime.upload_service().max_upload_bytes() + MULTIPART_OVERHEAD;

    api::router()
        .route("/health", get(health))
        .nest_service("/files", ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(runtime)
}

async fn health() -> &'static str {
    "ok"
}
