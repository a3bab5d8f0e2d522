use axum::http::StatusCode;
use thiserror::Error;

/// Failures of the persistence medium. Decode problems never show up here;
/// readers fall back to a default instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },
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

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Rejected `(field, value)` pair for an exercise update.
#[derive(Debug, Error, PartialEq)]
pub enum UpdateError {
    #[error("unknown field `{0}` (expected done, weight or rpe)")]
    UnknownField(String),

    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: String },
}

impl From<UpdateError> for AppError {
    fn from(err: UpdateError) -> Self {
        Self::bad_request(err.to_string())
    }
}
