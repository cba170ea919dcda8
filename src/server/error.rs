//! Mapping from crate errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::error::Error;

/// Handler error rendered as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidOrder(_)
            | Error::InvalidSettings(_)
            | Error::RiskLimit(_)
            | Error::UnknownCoin(_)
            | Error::NotConfigured => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self.0, "Request failed");
        } else {
            warn!(%status, error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}
