//! HTTP error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::domain::error::RulebenchError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<RulebenchError> for WebError {
    fn from(err: RulebenchError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

pub fn status_from_error(err: &RulebenchError) -> StatusCode {
    match err {
        RulebenchError::Parse(_)
        | RulebenchError::Structural { .. }
        | RulebenchError::UnsupportedConstruct { .. }
        | RulebenchError::ConfigParse { .. }
        | RulebenchError::ConfigMissing { .. }
        | RulebenchError::ConfigInvalid { .. } => StatusCode::BAD_REQUEST,
        RulebenchError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RulebenchError::Interpret { .. } => StatusCode::BAD_GATEWAY,
        RulebenchError::Cancelled { .. } => StatusCode::GATEWAY_TIMEOUT,
        RulebenchError::Data { .. } | RulebenchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
