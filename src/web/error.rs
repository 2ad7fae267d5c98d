//! HTTP mapping of service errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use log::debug;

use crate::errors::ServiceError;

use super::types::{ErrorBody, ErrorDetail};

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        debug!("Responding {} ({}): {}", status, self.code(), self);

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
