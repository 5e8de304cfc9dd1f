//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid type: {0}")]
    InvalidType(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage not configured: {0}")]
    Config(String),
    #[error("upload: {0}")]
    Upload(String),
    #[error("invalid body: {0}")]
    InvalidBody(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("object storage: {0}")]
    Storage(String),
}

/// Flat error envelope: `{"error": "<message>"}`. Every failure path
/// serializes through this, never an HTML error page.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidType(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Upload(_)
            | AppError::InvalidBody(_)
            | AppError::Db(_)
            | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
