use axum::http::StatusCode;
use axum::Json;
use jobsite::pagination::{Paginated, Pagination};
use serde::Serialize;

/// `{ success: true, data, pagination? }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
        pagination: None,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

pub fn paginated<T: Serialize>(page: Paginated<T>) -> Json<Envelope<Vec<T>>> {
    Json(Envelope {
        success: true,
        data: page.items,
        pagination: Some(page.pagination),
    })
}

/// Body of a successful delete
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
}
