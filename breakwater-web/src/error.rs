//! Error to HTTP status classification.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use breakwater_core::models::ErrorResponse;
use breakwater_core::Error;

/// Wrapper giving core errors an HTTP shape.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

/// Maps an error message to a status by substring, the gateway's
/// long-standing contract.
pub(crate) fn status_for_message(message: &str) -> StatusCode {
    if message.contains("failed to parse") {
        StatusCode::BAD_REQUEST
    } else if message.contains("forbidden") {
        StatusCode::FORBIDDEN
    } else if message.contains("not found") {
        StatusCode::NOT_FOUND
    } else if message.contains("timeout") {
        StatusCode::REQUEST_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        let status = status_for_message(&message);
        tracing::error!(error = %message, status = status.as_u16(), "request failed");
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            status_for_message("failed to parse magnet: bad"),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for_message("forbidden: permission denied"),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for_message("not found sha1=abc"),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for_message("magnet timeout: deadline exceeded"),
            StatusCode::REQUEST_TIMEOUT
        );
        assert_eq!(
            status_for_message("something else broke"),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
