use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{debug, warn};
use serde_json::json;

use crate::core::TallyError;

pub struct ApiError(pub TallyError);

impl From<TallyError> for ApiError {
    fn from(err: TallyError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TallyError::InvalidRequest(_)
            | TallyError::InvalidDateFormat { .. }
            | TallyError::ChronologicalOrder
            | TallyError::NotFound(_) => StatusCode::BAD_REQUEST,
            TallyError::StorageUnavailable(_) | TallyError::Cancelled => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            TallyError::DecodeError(_) => StatusCode::BAD_GATEWAY,
            TallyError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            TallyError::IoError(_) | TallyError::ConfigParsingError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            debug!("rejected request: {}", self.0);
        } else {
            warn!("request failed: {}", self.0);
        }
        error_response(status, self.0.to_string())
    }
}

pub fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}
