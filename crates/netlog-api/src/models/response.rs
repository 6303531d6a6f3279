use axum::{http::StatusCode, Json};
use serde::Serialize;
use uuid::Uuid;

/// JSON error response
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (status, Json(Self {
            error: message.into(),
            code: status.as_u16(),
        }))
    }

    pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> (StatusCode, Json<Self>) {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub file_name: String,
    pub excerpt: String,
    pub matched_lines: usize,
    pub truncated: bool,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    // false when the answer is an error rendered as text
    pub ok: bool,
    pub session_id: String,
    pub transport: String,
    pub response_time_ms: u128,
}
