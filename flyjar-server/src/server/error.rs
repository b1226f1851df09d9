use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flyjar_shared::api::{ErrorResp, messages};

use crate::storage::StorageError;

/// Failure at the handler boundary. Every variant renders as `{"error": ...}`
/// with a Spanish message; the cause is logged and never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed body, missing field or unparsable path parameter.
    #[error("{message}")]
    Validation {
        message: &'static str,
        detail: String,
    },
    #[error("{}", messages::USER_EXISTS)]
    DuplicateUsername,
    #[error("{}", messages::USER_NOT_FOUND)]
    UserNotFound,
    #[error("{}", messages::WRONG_PASSWORD)]
    InvalidCredentials,
    #[error("{}", messages::INVALID_SESSION)]
    InvalidSession,
    /// Any other failure, reported with the route's own message.
    #[error("{message}")]
    Store {
        message: &'static str,
        #[source]
        source: StorageError,
    },
}

impl AppError {
    pub fn validation(message: &'static str) -> Self {
        Self::Validation {
            message,
            detail: "missing required field".into(),
        }
    }

    /// Maps an extractor rejection to a validation failure carrying `message`.
    pub fn rejected<E: fmt::Display>(message: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::Validation {
            message,
            detail: e.to_string(),
        }
    }

    /// Maps a storage failure to a 400 carrying `message`.
    pub fn store(message: &'static str) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Store { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::InvalidSession => StatusCode::UNAUTHORIZED,
            AppError::Validation { .. }
            | AppError::DuplicateUsername
            | AppError::UserNotFound
            | AppError::Store { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation",
            AppError::DuplicateUsername => "duplicate_username",
            AppError::UserNotFound => "user_not_found",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::InvalidSession => "invalid_session",
            AppError::Store { .. } => "store",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let msg = self.to_string();
        match &self {
            AppError::Store { source, .. } => {
                tracing::error!(status = %status, kind, message = %msg, detail = %source, "request failed");
            }
            AppError::Validation { detail, .. } => {
                tracing::warn!(status = %status, kind, message = %msg, detail = %detail, "request failed");
            }
            _ => {
                tracing::warn!(status = %status, kind, message = %msg, "request failed");
            }
        }
        (status, axum::Json(ErrorResp { error: msg })).into_response()
    }
}
