use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::protocol::ErrorBody;
use crate::store::StoreError;
use crate::types::ViewPhase;

/// Errors surfaced by room and view operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Room {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Cannot {action} while view is {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: ViewPhase,
    },

    #[error("View {0} not found or expired")]
    UnknownView(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::UnknownView(_) => "UNKNOWN_VIEW",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::UnknownView(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = ErrorBody {
            code: self.code().to_string(),
            msg: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
