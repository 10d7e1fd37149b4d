use axum::{http::StatusCode, response::Json};
use serde::Serialize;

use crate::error::{Error, FieldErrors};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
            fields: None,
        }
    }

    pub fn with_fields(message: &str, fields: FieldErrors) -> Self {
        Self {
            error: message.to_string(),
            fields: Some(fields),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl From<Error> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_fields("Validation failed", fields)),
            ),
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, Json(ErrorResponse::new(&err.to_string()))),
            Error::Conflict(message) => (StatusCode::CONFLICT, Json(ErrorResponse::new(&message))),
            Error::Resolution(e) => {
                log::error!("Failed to build representation: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(&e.to_string())),
                )
            }
            Error::Store(e) => {
                log::error!("Storage failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(&e.to_string())),
                )
            }
        }
    }
}
