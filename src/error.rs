//! Application error type shared by every layer.
//!
//! Each variant carries a human-readable message plus a JSON `details` value that is
//! returned to API clients. Store failures keep their details server-side.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload: `{ "code", "message", "details" }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// Update touched a field outside the mutable allow-list.
    #[error("{message}")]
    InvalidField { message: String, details: Value },

    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// The link exists but belongs to another owner.
    #[error("{message}")]
    AccessDenied { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The store rejected a short code that is already taken.
    #[error("{message}")]
    DuplicateCode { message: String, details: Value },

    /// Code generation retries were used up.
    #[error("{message}")]
    GenerationExhausted { message: String, details: Value },

    /// Transport, transaction or timeout failure in the store.
    #[error("{message}")]
    Store { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_field(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidField {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn access_denied(message: impl Into<String>, details: Value) -> Self {
        Self::AccessDenied {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn duplicate_code(message: impl Into<String>, details: Value) -> Self {
        Self::DuplicateCode {
            message: message.into(),
            details,
        }
    }

    pub fn generation_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::GenerationExhausted {
            message: message.into(),
            details,
        }
    }

    pub fn store(message: impl Into<String>, details: Value) -> Self {
        Self::Store {
            message: message.into(),
            details,
        }
    }

    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::InvalidField { .. } => (StatusCode::BAD_REQUEST, "invalid_field"),
            AppError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "access_denied"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::DuplicateCode { .. } => (StatusCode::CONFLICT, "duplicate_code"),
            AppError::GenerationExhausted { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_exhausted")
            }
            AppError::Store { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Builds the client-facing payload. Store details are never exposed.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        match self {
            AppError::Store { .. } => ErrorInfo {
                code,
                message: "Internal server error".to_string(),
                details: json!({}),
            },
            AppError::Validation { message, details }
            | AppError::InvalidField { message, details }
            | AppError::Unauthorized { message, details }
            | AppError::AccessDenied { message, details }
            | AppError::NotFound { message, details }
            | AppError::DuplicateCode { message, details }
            | AppError::GenerationExhausted { message, details } => ErrorInfo {
                code,
                message: message.clone(),
                details: details.clone(),
            },
        }
    }

    /// Returns true for failures worth retrying (store transport errors).
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Store { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();

        if let AppError::Store { message, details } = &self {
            tracing::error!(%message, %details, "Store error");
        }

        let mut response = (
            status,
            Json(ErrorBody {
                error: self.to_error_info(),
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

/// Maps a database error onto the application taxonomy.
///
/// A unique violation on the short code becomes [`AppError::DuplicateCode`] and a
/// foreign key violation becomes [`AppError::Validation`]; everything else is a
/// store failure.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if crate::utils::db_error::is_unique_violation_on_code(&e) {
        return AppError::duplicate_code("Short code already exists", json!({}));
    }

    if crate::utils::db_error::is_foreign_key_violation(&e) {
        let constraint = e
            .as_database_error()
            .and_then(|db_err| db_err.constraint())
            .map(str::to_string);
        return AppError::bad_request(
            "Referenced record does not exist",
            json!({ "constraint": constraint }),
        );
    }

    if let sqlx::Error::RowNotFound = e {
        return AppError::not_found("Link not found", json!({}));
    }

    AppError::store("Database error", json!({ "reason": e.to_string() }))
}
