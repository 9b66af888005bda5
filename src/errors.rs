use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Validation,
}

/// Failure while retrieving or validating a data resource.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("fetching {resource} failed with status {status}")]
    Fetch { resource: String, status: u16 },
    #[error("fetching {resource} failed: {message}")]
    Transport { resource: String, message: String },
    #[error("fetching {resource} timed out")]
    Timeout { resource: String },
    #[error("invalid payload in {resource}: {reason}")]
    Validation { resource: String, reason: String },
}

impl LoadError {
    pub fn validation(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::Validation { .. } => ErrorKind::Validation,
            _ => ErrorKind::Fetch,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LoadError::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server errors and transport failures may succeed on another attempt;
    /// client errors and malformed payloads will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LoadError::Fetch { status, .. } => *status >= 500,
            LoadError::Transport { .. } | LoadError::Timeout { .. } => true,
            LoadError::Validation { .. } => false,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
