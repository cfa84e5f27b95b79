//! Uniform JSON envelope returned by every HTTP endpoint
//!
//! Successful and failed responses share the same shape:
//! `{ "status": 200, "data": ..., "message": "...", "success": true }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body
    pub status: u16,
    /// Payload, `null` for errors
    pub data: T,
    /// Human-readable message
    pub message: String,
    /// `true` for any status below 400
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data` with the given status code and message
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    /// 200 OK
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    /// 201 Created
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl ApiResponse<Option<()>> {
    /// Error envelope with a `null` payload
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, None, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
