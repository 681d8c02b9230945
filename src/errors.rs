use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::prediction::{PipelineError, PredictionError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Submitted records failed validation or lack a required upstream result.
    #[error("{message}")]
    Unprocessable {
        message: String,
        details: Vec<String>,
    },

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Vec::new()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Vec::new()),
            AppError::Unprocessable { message, details } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message, details)
            }
            AppError::Prediction(msg) => {
                tracing::error!("Prediction error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, Vec::new())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".into(),
                    Vec::new(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
                details,
            }),
        )
            .into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidRecords { .. } => AppError::Unprocessable {
                details: e.details(),
                message: e.to_string(),
            },
            PipelineError::Prediction(inner @ PredictionError::MissingDependency { .. }) => {
                AppError::Unprocessable {
                    message: inner.to_string(),
                    details: Vec::new(),
                }
            }
            PipelineError::Prediction(inner) => AppError::Prediction(inner.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_maps_to_422() {
        let err: AppError = PipelineError::Prediction(PredictionError::MissingDependency {
            position: 3,
            field: "grade",
        })
        .into();
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_malformed_output_maps_to_500() {
        let err: AppError = PipelineError::Prediction(PredictionError::MalformedOutput {
            position: 0,
            model: "grade".into(),
            expected: 7,
            actual: 6,
        })
        .into();
        assert!(matches!(&err, AppError::Prediction(msg) if msg.contains("record 0")));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
