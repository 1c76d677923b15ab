use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jobsite::error::JobsiteError;
use log::error;
use serde_json::json;

const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Every failure a handler can produce, rendered as `{ success: false, error }`
#[derive(Debug)]
pub enum ApiError {
    Domain(JobsiteError),
    /// The request could not be decoded
    Rejected(StatusCode, String),
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(err) => domain_status(err),
            ApiError::Rejected(status, _) => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn rejected(status: StatusCode, message: String) -> Self {
        // Content type and validation rejections are all reported as bad requests
        let status = if status == StatusCode::PAYLOAD_TOO_LARGE {
            status
        } else {
            StatusCode::BAD_REQUEST
        };
        ApiError::Rejected(status, message)
    }
}

fn domain_status(err: &JobsiteError) -> StatusCode {
    match err {
        JobsiteError::BadInput(_)
        | JobsiteError::InvalidUrl(_)
        | JobsiteError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
        JobsiteError::Unauthorized | JobsiteError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
        JobsiteError::Forbidden(_) | JobsiteError::ProjectLimitReached { .. } => {
            StatusCode::FORBIDDEN
        }
        JobsiteError::NotFound { .. } => StatusCode::NOT_FOUND,
        JobsiteError::Conflict(_) => StatusCode::CONFLICT,
        JobsiteError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            match &self {
                ApiError::Domain(err) => error!("Request failed: {err}"),
                ApiError::Rejected(_, msg) | ApiError::Internal(msg) => {
                    error!("Request failed: {msg}");
                }
            }
            INTERNAL_SERVER_ERROR.to_string()
        } else {
            match self {
                ApiError::Domain(JobsiteError::InvalidToken(_)) => "Unauthorized".to_string(),
                ApiError::Domain(err) => err.to_string(),
                ApiError::Rejected(_, msg) | ApiError::Internal(msg) => msg,
            }
        };
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<JobsiteError> for ApiError {
    fn from(err: JobsiteError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::rejected(err.status(), err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (JobsiteError::BadInput("x".into()), StatusCode::BAD_REQUEST),
            (
                JobsiteError::InvalidTransition {
                    from: "approved".into(),
                    to: "rejected".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (JobsiteError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                JobsiteError::ProjectLimitReached {
                    tier: "basic".into(),
                    limit: 3,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                JobsiteError::NotFound {
                    entity: "Project",
                    id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (JobsiteError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                JobsiteError::PayloadTooLarge { size: 2, limit: 1 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (JobsiteError::Sql("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (JobsiteError::LockPoisoned, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_rejections_become_bad_requests() {
        let err = ApiError::rejected(StatusCode::UNPROCESSABLE_ENTITY, "missing field".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err = ApiError::rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big".into());
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
