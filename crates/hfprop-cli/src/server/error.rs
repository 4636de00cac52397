//! Error responses for the prediction API

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hfprop_core::PredictError;
use tracing::{debug, warn};

pub type ApiResult<T> = Result<T, ApiError>;

/// Renders a [`PredictError`] as `{ error, code, category, diagnostics? }`.
#[derive(Debug)]
pub struct ApiError(PredictError);

impl From<PredictError> for ApiError {
    fn from(error: PredictError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(code = self.0.code(), category = %self.0.category(), "{}", self.0.message());
        } else {
            debug!(code = self.0.code(), "{}", self.0.message());
        }
        (status, Json(self.0.report())).into_response()
    }
}
