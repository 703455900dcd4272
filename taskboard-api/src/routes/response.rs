/// Success envelope shared by every endpoint
///
/// ```json
/// { "message": "User created", "data": { ... } }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope body
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub message: String,
    pub data: Value,
}

/// Status plus envelope
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    body: Envelope,
}

impl ApiResponse {
    /// 200 with `message`
    pub fn ok(message: impl Into<String>, data: Value) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    /// 201 with `message`
    pub fn created(message: impl Into<String>, data: Value) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>, data: Value) -> Self {
        Self {
            status,
            body: Envelope {
                message: message.into(),
                data,
            },
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
