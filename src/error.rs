//! Error types for the bookstore server

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::logic::OperationError;

/// Message returned for every object-level permission failure
pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action.";

/// Stable machine-readable error codes sent in the `code` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Invalid,
    NotAuthenticated,
    AuthenticationFailed,
    PermissionDenied,
    NotFound,
    Conflict,
    Error,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Invalid => "invalid",
            ErrorCode::NotAuthenticated => "not_authenticated",
            ErrorCode::AuthenticationFailed => "authentication_failed",
            ErrorCode::PermissionDenied => "permission_denied",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::Error => "error",
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("{}", PERMISSION_DENIED_MESSAGE)]
    PermissionDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid input: {0}")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Arithmetic error: {0}")]
    Operation(#[from] OperationError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human readable message
    pub detail: String,
    /// Stable error code
    pub code: String,
    /// Per-field messages, only present for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, Vec<String>>>,
}

fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;

        let (status, code, detail) = match &self {
            AppError::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::NotAuthenticated,
                self.to_string(),
            ),
            AppError::Authentication(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::AuthenticationFailed,
                msg.clone(),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorCode::PermissionDenied,
                PERMISSION_DENIED_MESSAGE.to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::Invalid, msg.clone())
            }
            AppError::InvalidFields(errors) => {
                fields = Some(field_messages(errors));
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::Invalid,
                    "Invalid input.".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Conflict, msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Error,
                    "Database error".to_string(),
                )
            }
            AppError::Operation(e) => {
                tracing::error!("Arithmetic error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Error,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Error,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            detail,
            code: code.as_str().to_string(),
            fields,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
