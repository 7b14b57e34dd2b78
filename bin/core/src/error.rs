use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Serialize;

/// One variant per row of the error-kinds table: trigger, recovery
/// policy, and HTTP surface are all determined by which variant fires.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Validation(String),

  #[error("another operation is in progress for this stack")]
  ConflictLock,

  #[error("plan is stale, regenerate plan")]
  ConflictStale,

  #[error("runtime error: {0}")]
  RuntimeFatal(String),

  #[error("failed to write configuration: {0}")]
  FilesystemFatal(String),

  #[error("compose up failed: {0}")]
  ComposeFatal(String),

  #[error(transparent)]
  Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
  error: String,
}

impl IntoResponse for CoreError {
  fn into_response(self) -> Response {
    let status = match &self {
      CoreError::NotFound(_) => StatusCode::NOT_FOUND,
      CoreError::Validation(_) => StatusCode::BAD_REQUEST,
      CoreError::ConflictLock | CoreError::ConflictStale => {
        StatusCode::CONFLICT
      }
      CoreError::RuntimeFatal(_)
      | CoreError::FilesystemFatal(_)
      | CoreError::ComposeFatal(_)
      | CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::error!("{self:#}");
    (status, Json(ErrorBody { error: self.to_string() }))
      .into_response()
  }
}

pub type CoreResult<T> = Result<T, CoreError>;
