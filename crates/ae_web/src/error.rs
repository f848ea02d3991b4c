use ae_core::envelope::ErrorResponse;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;
use uuid::Uuid;

/// Error envelope returned by every handler.
///
/// Server errors never echo their cause. The client gets an opaque code and
/// the cause is logged under the same code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            body: ErrorResponse::new(message),
        }
    }

    pub fn internal(cause: &dyn std::fmt::Display) -> Self {
        let code = format!("ERR-{}", &Uuid::new_v4().simple().to_string()[..8]);
        error!(code = %code, "❌ Request failed: {}", cause);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse::with_code("Server Error", code),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ae_core::Error> for ApiError {
    fn from(error: ae_core::Error) -> Self {
        match error {
            ae_core::Error::Validation(message) => Self::new(StatusCode::BAD_REQUEST, &message),
            ae_core::Error::NotFound(message) => Self::new(StatusCode::NOT_FOUND, &message),
            other => Self::internal(&other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            &format!("Invalid request body: {}", rejection.body_text()),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            &format!("Invalid query string: {}", rejection.body_text()),
        )
    }
}
