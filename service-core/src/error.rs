use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name -> human readable problem, in a stable order.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Invalid fields: {message}")]
    InvalidFields {
        message: String,
        fields: FieldErrors,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payment verification failed")]
    PaymentVerificationFailed,

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    /// Failure of an external collaborator. Only `message` reaches the client.
    #[error("{message}: {source:#}")]
    Upstream {
        message: String,
        source: anyhow::Error,
    },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn upstream(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Upstream {
            message: message.into(),
            source: source.into(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Server-side failures are logged here; the body only ever carries a generic message.
        match &self {
            AppError::Upstream { .. }
            | AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::ConfigError(_) => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => {}
        }

        let (status, error, details, fields, retry_after) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                "Missing required fields".to_string(),
                Some(err.to_string()),
                None,
                None,
            ),
            AppError::InvalidFields { message, fields } => {
                (StatusCode::BAD_REQUEST, message, None, Some(fields), None)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None, None, None),
            AppError::PaymentVerificationFailed => (
                StatusCode::BAD_REQUEST,
                "Payment verification failed".to_string(),
                None,
                None,
                None,
            ),
            AppError::Unauthorized(err) => {
                (StatusCode::UNAUTHORIZED, err.to_string(), None, None, None)
            }
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string(), None, None, None),
            AppError::TooManyRequests(msg, retry) => {
                (StatusCode::TOO_MANY_REQUESTS, msg, None, None, retry)
            }
            AppError::Upstream { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, None, None, None)
            }
            AppError::InternalError(_) | AppError::DatabaseError(_) | AppError::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
                None,
                None,
            ),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error,
                details,
                fields,
            }),
        )
            .into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}
