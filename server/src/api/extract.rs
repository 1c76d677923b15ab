use super::error::ApiError;
use super::{call, SharedState};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderName;
use jobsite::auth::{Principal, TokenCandidates};
use jobsite::pagination::PageRequest;
use serde::Deserialize;

/// `axum::Json` answering malformed bodies with the JSON error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// `page` and `pageSize` of every list endpoint
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

/// The authenticated caller. Requests without a valid token are answered with 401.
pub struct Auth(pub Principal);

impl FromRequestParts<SharedState> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let auth = &state.config().auth;
        let candidates = TokenCandidates::from_headers(
            header_value(parts, &AUTHORIZATION),
            header_value(parts, &COOKIE),
            &auth.admin_cookie,
            &auth.user_cookie,
        );
        let principal = call(state, move |runtime| {
            runtime.authenticator().authenticate(&candidates)
        })
        .await?;
        Ok(Auth(principal))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &HeaderName) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}
