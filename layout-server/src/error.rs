//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use layout_core::{LayoutError, PersistenceError};
use serde::Serialize;
use thiserror::Error;

use crate::validation::ValidationError;

/// Result type for request handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request data failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The layout engine rejected the operation.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        Self::Layout(LayoutError::Persistence(err))
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: &'static str,
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Status code and error code for this error.
    #[must_use]
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
            Self::Layout(err) => match err {
                LayoutError::SectionNotFound(_) => (StatusCode::NOT_FOUND, "section_not_found"),
                LayoutError::NotEditable(_) => (StatusCode::CONFLICT, "not_editable"),
                LayoutError::DragInProgress(_) => (StatusCode::CONFLICT, "drag_in_progress"),
                LayoutError::BoundsViolation { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "bounds_violation")
                }
                LayoutError::PlacementExhausted { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "placement_exhausted")
                }
                LayoutError::InvalidKind(_) | LayoutError::InvalidConfig(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_request")
                }
                LayoutError::MalformedSection { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "malformed_section")
                }
                LayoutError::Persistence(PersistenceError::VersionConflict { .. }) => {
                    (StatusCode::CONFLICT, "version_conflict")
                }
                LayoutError::Persistence(PersistenceError::NotFound(_)) => {
                    (StatusCode::NOT_FOUND, "layout_not_found")
                }
                LayoutError::Persistence(_) => (StatusCode::SERVICE_UNAVAILABLE, "persistence"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected ({code}): {self}");
        }
        let body = ErrorBody {
            code,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout_core::{GridPosition, GridSize, SectionId};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(ValidationError::MenuKeyInvalidChars),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(LayoutError::SectionNotFound(SectionId::from_string("x"))),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(LayoutError::NotEditable(SectionId::from_string("x"))),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(LayoutError::PlacementExhausted {
                    size: GridSize::new(1, 4),
                    target: GridPosition::new(0, 0),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(PersistenceError::VersionConflict {
                    menu_key: "m".to_string(),
                    stored: 3,
                    attempted: 2,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(PersistenceError::Io(std::io::Error::other("disk"))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.classify().0, expected, "{err}");
        }
    }

    #[test]
    fn test_error_body_serialization() {
        let body = ErrorBody {
            code: "not_editable",
            error: "Section is not editable: category-mains".to_string(),
        };
        let json = serde_json::to_string(&body).expect("should serialize");
        assert!(json.contains("not_editable"));
        assert!(json.contains("category-mains"));
    }
}
