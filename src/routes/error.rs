//! Boundary translation from [`AlarmError`] to the JSON failure envelope.

use axum::{
    extract::rejection::{FormRejection, JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::AlarmError;

// ---

/// `{success, message}` body shared by every non-listing endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
}

/// A failed request: status code plus the message the client sees.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    // ---
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Build a mapper for `map_err`. `failure` is what the client sees when
    /// the datastore fails; the underlying error only goes to the log.
    pub fn context(failure: &'static str) -> impl Fn(AlarmError) -> ApiError {
        // ---
        move |err| match err {
            AlarmError::Validation(message) => ApiError::bad_request(message),
            AlarmError::NotFound => ApiError {
                status: StatusCode::NOT_FOUND,
                message: AlarmError::NotFound.to_string(),
            },
            AlarmError::Storage(e) => {
                error!(error = %e, "{}", failure);
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: failure.to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::bad_request(format!("Invalid form body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let body = Envelope {
            success: false,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
