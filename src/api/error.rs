//! HTTP rendering of [`Error`].

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable reason, see [`Error::kind`]
    pub error: &'static str,
    /// Human-readable message
    pub message: String,
}

/// Status code for an error.
#[must_use]
pub const fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::DuplicateUsername { .. } => StatusCode::CONFLICT,
        Error::ChefNotApproved => StatusCode::FORBIDDEN,
        Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
        Error::Config { .. }
        | Error::Crypto { .. }
        | Error::Database(_)
        | Error::Io(_)
        | Error::EnvVar(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = if status.is_server_error() {
            // Internal details stay in the log
            error!("request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
