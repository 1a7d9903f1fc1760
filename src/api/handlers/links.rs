//! Handlers for link management endpoints.
//!
//! Every handler runs behind [`crate::api::middleware::auth`], which resolves the
//! bearer token to an [`OwnerId`] request extension.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{CreateLinkRequest, LinkListResponse, LinkResponse, UpdateLinkRequest};
use crate::domain::entities::OwnerId;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for the caller.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/some/long/path" }
/// ```
///
/// If the caller already shortened the same URL, the existing link is returned.
///
/// # Errors
///
/// Returns 400 Bad Request if the URL is invalid.
/// Returns 503 Service Unavailable if no free short code was found.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state.link_service.create(&payload.url, owner).await?;

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::from_link(link, &state.public_base_url)),
    ))
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> Result<Json<LinkListResponse>, AppError> {
    let items: Vec<LinkResponse> = state
        .link_service
        .list_owned(owner)
        .await?
        .into_iter()
        .map(|link| LinkResponse::from_link(link, &state.public_base_url))
        .collect();

    Ok(Json(LinkListResponse {
        total: items.len(),
        items,
    }))
}

/// Returns one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/links/{id}`
///
/// # Errors
///
/// Returns 404 Not Found if the link does not exist.
/// Returns 403 Forbidden if it belongs to another owner.
pub async fn get_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_owned(id, owner).await?;

    Ok(Json(LinkResponse::from_link(link, &state.public_base_url)))
}

/// Partially updates one of the caller's links.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// # Request Body
///
/// Any subset of `original_url`, `short_code` and `click_count`:
///
/// ```json
/// { "short_code": "promo", "click_count": 100 }
/// ```
///
/// # Errors
///
/// Returns 403 / 404 as for `GET`, before the body is looked at.
/// Returns 400 Bad Request for an unknown field, a wrong value type, an invalid
/// value, or a click count lower than the current one.
/// Returns 409 Conflict if the new short code is taken.
pub async fn update_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    state.link_service.get_owned(id, owner).await?;
    let changes = payload.into_changes()?;

    let link = state.link_service.update_owned(id, owner, changes).await?;

    Ok(Json(LinkResponse::from_link(link, &state.public_base_url)))
}

/// Deletes one of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// The link and its owner association are removed together; the short code
/// stops resolving immediately.
///
/// # Errors
///
/// Returns 403 / 404 as for `GET`. Nothing is deleted on error.
pub async fn delete_link_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_owned(id, owner).await?;

    Ok(StatusCode::NO_CONTENT)
}
