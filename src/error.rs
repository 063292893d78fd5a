use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("{0}")]
  Validation(String),

  #[error("account not found")]
  NotFound,

  #[error("referrer not found")]
  ReferrerNotFound,

  #[error("an active account with the same identity already exists")]
  DuplicateAccount,

  #[error("credential check failed or caller lacks permission")]
  Unauthorized,

  #[error("insufficient wallet balance")]
  InsufficientBalance,

  #[error("account still has active subordinates")]
  HasDependents,

  /// Concurrent modification detected; safe to retry.
  #[error("concurrent modification detected, retry the operation")]
  Conflict,

  /// Store operation exceeded its deadline; safe to retry only if the
  /// operation never reached the write phase.
  #[error("operation timed out")]
  Timeout,

  /// Unexpected store failure. Logged in full, never detailed to the
  /// caller.
  #[error("internal storage error")]
  Internal(#[from] sea_orm::DbErr),
}

impl Error {
  fn status(&self) -> StatusCode {
    match self {
      Error::Validation(_) | Error::InsufficientBalance => {
        StatusCode::BAD_REQUEST
      }
      Error::NotFound | Error::ReferrerNotFound => StatusCode::NOT_FOUND,
      Error::DuplicateAccount | Error::HasDependents | Error::Conflict => {
        StatusCode::CONFLICT
      }
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
      Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    if let Error::Internal(ref err) = self {
      tracing::error!("storage error: {err}");
    }

    let body = json::json!({
      "success": false,
      "msg": self.to_string(),
    });

    (self.status(), Json(body)).into_response()
  }
}
