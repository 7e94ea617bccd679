//! API error type and [`axum::response::IntoResponse`] implementation.

use among_core::merge::MergeError;
use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  /// Distinct business-rule violations, one string each.
  #[error("validation failed")]
  Unprocessable(Vec<String>),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map an engine failure onto the HTTP taxonomy: gate rejections are 422,
  /// a vanished fish is 404, anything else a 500.
  pub fn from_merge<E>(err: MergeError<E>) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    match err {
      MergeError::Rejected(v) => ApiError::Unprocessable(v.errors),
      MergeError::NotFound(id) => {
        ApiError::NotFound(format!("fish {id} not found"))
      }
      MergeError::Store(e) => ApiError::Store(Box::new(e)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(message) => (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "message": message })),
      )
        .into_response(),
      ApiError::Unprocessable(errors) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
          "success": false,
          "message": "validation failed",
          "errors": errors,
        })),
      )
        .into_response(),
      ApiError::Conflict(message) => (
        StatusCode::CONFLICT,
        Json(json!({ "success": false, "message": message })),
      )
        .into_response(),
      ApiError::Store(cause) => {
        // The cause stays in the log; the caller gets a sanitized message.
        tracing::error!(error = %cause, "request failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "success": false, "message": "operation failed" })),
        )
          .into_response()
      }
    }
  }
}
