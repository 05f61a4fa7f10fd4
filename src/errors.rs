// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

// Allow anyhow::Error to be converted into AppError::Internal for convenience
// in handlers that call into anyhow-returning helpers.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    if err.is::<sqlx::Error>() {
      return AppError::Sqlx(err.downcast::<sqlx::Error>().unwrap());
    }
    AppError::Internal(err.to_string())
  }
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({ "message": m })),
      AppError::Auth(m) => HttpResponse::Unauthorized().json(json!({ "message": m })),
      AppError::Forbidden(m) => HttpResponse::Forbidden().json(json!({ "message": m })),
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({ "message": m })),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({ "message": "Configuration issue", "detail": m }))
      }
      AppError::Sqlx(_) => HttpResponse::InternalServerError().json(json!({ "message": "Database operation failed" })),
      AppError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({ "message": "An internal error occurred", "detail": m }))
      }
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
