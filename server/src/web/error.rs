use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::dashboard::DashboardError;
use crate::grid::GridError;

/// Errors returned by the JSON API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no active session")]
    NoSession,
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NoSession => StatusCode::UNAUTHORIZED,
            ApiError::Dashboard(DashboardError::NotReady) => StatusCode::CONFLICT,
            ApiError::Dashboard(DashboardError::Grid(
                GridError::UnknownList(_) | GridError::UnknownUser(_),
            )) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
