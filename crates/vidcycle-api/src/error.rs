//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use vidcycle_core::Error;

#[derive(Debug)]
pub enum ApiError {
    Internal(Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Upstream(String),
    Unavailable(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::NotFound(_) | Error::VideoNotFound(_) | Error::LabelNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::InvalidLabelName(_) => ApiError::BadRequest(err.to_string()),
            Error::DuplicateLabelName { .. }
            | Error::Duplicate(_)
            | Error::AlreadySystemLabel(_) => ApiError::Conflict(err.to_string()),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            Error::Config(msg) => ApiError::Unavailable(msg.clone()),
            Error::Inference(_) | Error::Storage(_) | Error::Request(_) | Error::Parse(_) => {
                ApiError::Upstream(err.to_string())
            }
            _ if err.is_unique_violation() => ApiError::Conflict(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: Error) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_of(Error::VideoNotFound(Uuid::nil())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(Error::InvalidLabelName("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::DuplicateLabelName {
                organization_id: Uuid::nil(),
                name: "DEMO".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(Error::Config("no key".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(Error::Inference("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(Error::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
