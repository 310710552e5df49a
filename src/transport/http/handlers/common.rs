use crate::error::DataError;
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub fn status_for(err: &DataError) -> StatusCode {
    match err {
        DataError::InvalidTable(_) | DataError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        DataError::NotFound { .. } => StatusCode::NOT_FOUND,
        DataError::DuplicateId { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: DataError) -> Response {
    (status_for(&err), Json(ApiResponse::failure(err.to_string()))).into_response()
}

pub fn ok_response<T: Serialize>(data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (StatusCode::OK, Json(ApiResponse::ok(value))).into_response(),
        Err(e) => error_response(DataError::Json(e)),
    }
}

/// `Ok` body or the mapped error response.
pub fn respond<T: Serialize>(result: Result<T, DataError>) -> Response {
    match result {
        Ok(data) => ok_response(&data),
        Err(e) => error_response(e),
    }
}
