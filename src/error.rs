//! Request-level error taxonomy
//!
//! Every handler failure ends up as an `AppError`, which knows the HTTP status
//! it maps to.

use hyper::StatusCode;
use thiserror::Error;

use crate::primitive::{ParseModeError, TransformError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("expected a multipart/form-data request: {0}")]
    NotMultipart(String),

    #[error("malformed multipart form: {0}")]
    MalformedForm(String),

    #[error("form field '{0}' is missing")]
    MissingField(&'static str),

    #[error("uploaded file '{0}' has no usable extension")]
    MissingExtension(String),

    #[error("request body exceeds {0} bytes")]
    TooLarge(u64),

    #[error(transparent)]
    InvalidMode(#[from] ParseModeError),

    #[error("invalid shape count '{0}'")]
    InvalidCount(String),

    #[error("unknown image '{0}'")]
    UnknownImage(String),

    #[error("storage error: {0}")]
    Store(StoreError),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidName(name) | StoreError::NotFound(name) => Self::UnknownImage(name),
            other => Self::Store(other),
        }
    }
}

impl AppError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotMultipart(_)
            | Self::MalformedForm(_)
            | Self::MissingField(_)
            | Self::MissingExtension(_)
            | Self::InvalidMode(_)
            | Self::InvalidCount(_)
            | Self::UnknownImage(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) | Self::Transform(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::MissingField("image").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ParseModeError("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::TooLarge(10).status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            AppError::from(TransformError::EmptyOutput("primitive".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(StoreError::Io(std::io::Error::other("disk full"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(StoreError::NotFound("a.png".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
