use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::ingest::ImportError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Workout with cardio log id {cardio_log_id} already exists")]
    DuplicateWorkout {
        cardio_log_id: String,
        workout_id: i32,
    },
    #[error("Invalid workout export: {0}")]
    Import(#[from] ImportError),
    #[error("Invalid JSON body: {0}")]
    JsonBody(#[from] JsonRejection),
    #[error("Invalid query string: {0}")]
    QueryString(#[from] QueryRejection),
    #[error("Invalid path parameter: {0}")]
    PathParam(#[from] PathRejection),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateWorkout { .. } => StatusCode::CONFLICT,
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::JsonBody(rejection) => rejection.status(),
            AppError::QueryString(_) => StatusCode::BAD_REQUEST,
            AppError::PathParam(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DuplicateWorkout { .. } => "DUPLICATE_WORKOUT",
            AppError::Import(_) => "INVALID_EXPORT",
            AppError::JsonBody(_) => "INVALID_JSON",
            AppError::QueryString(_) => "INVALID_QUERY",
            AppError::PathParam(_) => "INVALID_PATH",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::DuplicateWorkout {
                cardio_log_id,
                workout_id,
            } => Some(json!({
                "cardio_log_id": cardio_log_id,
                "workout_id": workout_id,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage failures are logged in full but reported generically.
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
            "details": self.details(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::not_found("Workout 7").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DuplicateWorkout {
                cardio_log_id: "abc".to_string(),
                workout_id: 3
            }
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(ImportError::MissingCardioLogId).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_details_carry_existing_id() {
        let err = AppError::DuplicateWorkout {
            cardio_log_id: "12345".to_string(),
            workout_id: 42,
        };
        let details = err.details().expect("duplicate carries details");
        assert_eq!(details["workout_id"], 42);
        assert_eq!(details["cardio_log_id"], "12345");
        assert_eq!(
            err.to_string(),
            "Workout with cardio log id 12345 already exists"
        );
    }
}
