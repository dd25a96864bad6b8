use axum::{http::StatusCode, response::IntoResponse, Json};
use log::{debug, error, warn};

use crate::mapping::MappingError;
use crate::store::{LocateError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
    #[error("Partial operation: {0}")]
    PartialOperation(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LocateError> for ApiError {
    fn from(e: LocateError) -> Self {
        match e {
            LocateError::Missing | LocateError::InvalidRow(_) => Self::InvalidInput(e.to_string()),
            LocateError::RowNotFound(_) | LocateError::IdNotFound(_) => {
                Self::NotFound(e.to_string())
            }
            LocateError::Mismatch { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::TableNotFound(_)) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Mapping(_) | Self::PartialOperation(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.to_string();
        match status {
            StatusCode::NOT_FOUND => {
                debug!("Not found: {message}");
                return (status, Json(serde_json::json!({ "message": message }))).into_response();
            }
            s if s.is_server_error() => error!("Request failed: {message}"),
            _ => warn!("Rejected request: {message}"),
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(LocateError::Mismatch {
                row: 3,
                expected: "a".into(),
                found: "b".into()
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(LocateError::Missing).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StoreError::Api {
                status: 503,
                message: "down".into()
            })
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::PartialOperation("clear".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
