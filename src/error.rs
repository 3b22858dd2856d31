use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}: {error}")]
    BadRequest { message: &'static str, error: String },
    #[error("Movie not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(message: &'static str, errors: &ValidationErrors) -> Self {
        Self::BadRequest { message, error: errors.to_string() }
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<jiff::Error> for AppError {
    fn from(err: jiff::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest { message, error } => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message, "error": error })))
                    .into_response()
            },
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": "Movie not found" })))
                    .into_response()
            },
            AppError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error", "error": err.to_string() })),
                )
                    .into_response()
            },
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
