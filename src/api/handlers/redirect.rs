//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::json;

use crate::application::services::RedirectOutcome;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look up the link by code
/// 2. Record the visit (bounded by the visit timeout, best-effort)
/// 3. Return 307 Temporary Redirect
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    match state.redirect_service.resolve(&code).await? {
        RedirectOutcome::Resolved { destination, .. } => Ok(Redirect::temporary(&destination)),
        RedirectOutcome::NotFound => Err(AppError::not_found(
            "Short link not found",
            json!({ "short_code": code }),
        )),
    }
}
