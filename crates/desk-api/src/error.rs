//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure renders the same envelope:
//! `{"success": false, "error": "<kind>", "message": "<text>"}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use desk_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] desk_core::Error),

  /// The request could not be decoded (body, path or query string).
  #[error("{0}")]
  BadRequest(String),
}

impl ApiError {
  fn status_and_kind(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::Core(e) => match e.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, e.kind().as_str()),
        ErrorKind::ValidationFailed => {
          (StatusCode::UNPROCESSABLE_ENTITY, e.kind().as_str())
        }
        ErrorKind::PersistenceFailed => {
          (StatusCode::INTERNAL_SERVER_ERROR, e.kind().as_str())
        }
      },
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, kind) = self.status_and_kind();
    let body = json!({
      "success": false,
      "error":   kind,
      "message": self.to_string(),
    });
    (status, Json(body)).into_response()
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

#[cfg(test)]
mod tests {
  use desk_core::Error;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn status_follows_error_kind() {
    let cases = [
      (Error::TicketNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
      (Error::validation("subject is required"), StatusCode::UNPROCESSABLE_ENTITY),
      (Error::TicketClosed(Uuid::nil()), StatusCode::UNPROCESSABLE_ENTITY),
      (
        Error::persistence(std::io::Error::other("disk full")),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), status);
    }
  }

  #[test]
  fn bad_request_kind() {
    let err = ApiError::BadRequest("missing field".into());
    assert_eq!(err.status_and_kind(), (StatusCode::BAD_REQUEST, "bad_request"));
  }
}
