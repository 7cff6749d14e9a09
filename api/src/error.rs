//! Transfer API error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::wire::{ErrorBody, ErrorCode};

/// Error returned by transfer API handlers.
///
/// Messages reference virtual paths only; physical server paths never leave
/// the process. Internal errors keep their detail in the log and answer
/// with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad path: {0}")]
    InvalidPath(String),

    #[error("space '{0}' does not exist")]
    UnknownSpace(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("path '{0}' is not a directory")]
    NotADirectory(String),

    #[error("path '{0}' is a directory")]
    IsADirectory(String),

    #[error("path '{0}' already exists")]
    AlreadyExists(String),

    #[error("parent dir '{0}' does not exist")]
    ParentMissing(String),

    #[error("malformed pattern: {0}")]
    InvalidPattern(String),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Map a filesystem error on `path` (a virtual path) to the API taxonomy.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(format!("path '{path}' does not exist"))
        } else {
            ApiError::Internal(err.into())
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::InvalidPath(_) => ErrorCode::InvalidPath,
            ApiError::UnknownSpace(_) => ErrorCode::UnknownSpace,
            ApiError::Unauthorized(_) => ErrorCode::Unauthorized,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::NotADirectory(_) => ErrorCode::NotADirectory,
            ApiError::IsADirectory(_) => ErrorCode::IsADirectory,
            ApiError::AlreadyExists(_) => ErrorCode::AlreadyExists,
            ApiError::ParentMissing(_) => ErrorCode::ParentMissing,
            ApiError::InvalidPattern(_) => ErrorCode::InvalidPattern,
            ApiError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPath(_)
            | ApiError::UnknownSpace(_)
            | ApiError::NotADirectory(_)
            | ApiError::IsADirectory(_)
            | ApiError::ParentMissing(_)
            | ApiError::InvalidPattern(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<common::fsglob::GlobError> for ApiError {
    fn from(err: common::fsglob::GlobError) -> Self {
        match err {
            common::fsglob::GlobError::Pattern(err) => ApiError::InvalidPattern(err.to_string()),
            common::fsglob::GlobError::Io(err) => ApiError::Internal(err.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            tracing::error!("internal error: {:#}", source);
        }
        let status = self.status_code();
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for transfer API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
