//! HTTP mapping for server errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::ServerError;

/// Maps a [`ServerError`] onto the wire: a status code plus a
/// `{"message": ...}` body. Backend faults all collapse to a bare 500 so
/// internals never leak to clients.
pub fn api_error_response(err: &ServerError) -> Response {
    let (status, message) = match err {
        ServerError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        ServerError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        ServerError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        ServerError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        ServerError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        ServerError::RateLimitExceeded { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded".to_string(),
        ),
        ServerError::ConfigurationError(_)
        | ServerError::StoreError(_)
        | ServerError::SearchError(_)
        | ServerError::InternalError(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        ),
    };

    message_response(status, &message)
}

/// A bare `{"message": ...}` response with the given status.
pub fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_404() {
        let response = api_error_response(&ServerError::NotFound("Flow".to_string()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_is_400() {
        let response = api_error_response(&ServerError::ValidationError(
            "Circular reference detected".to_string(),
        ));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rate_limit_is_429() {
        let response = api_error_response(&ServerError::RateLimitExceeded {
            resource: "search".to_string(),
            identifier: String::new(),
            max_requests: 100,
            window_ms: 60_000,
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn backend_faults_are_500() {
        let response =
            api_error_response(&ServerError::StoreError("connection refused".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
