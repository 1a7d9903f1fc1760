//! Link lifecycle service: creation, owner-scoped access, resolution and visit counting.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{Link, LinkChange, NewLink, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code, validate_short_code};
use crate::utils::url_validator::validate_destination;
use serde_json::json;
use tracing::{debug, info, warn};

/// Default number of codes tried before giving up on a create.
pub const DEFAULT_MAX_CODE_ATTEMPTS: usize = 5;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Service for creating, reading, mutating and resolving links.
///
/// Holds no mutable state of its own; consistency comes from the repository's
/// transactions.
pub struct LinkService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    store_timeout: Duration,
    max_code_attempts: usize,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    /// Creates a new link service with default timeout and retry budget.
    pub fn new(link_repository: Arc<L>) -> Self {
        Self {
            link_repository,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
        }
    }

    /// Sets the upper bound applied to every store call.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Sets how many generated codes are tried before failing a create.
    pub fn with_max_code_attempts(mut self, attempts: usize) -> Self {
        self.max_code_attempts = attempts.max(1);
        self
    }

    /// Shortens `url` for `owner`.
    ///
    /// # Deduplication
    ///
    /// If the owner already has a link for the same URL, that link is returned
    /// unchanged. Different owners get distinct codes for the same URL.
    ///
    /// # Code Generation
    ///
    /// A random 5-character code is generated and persisted together with the
    /// owner association. If the store reports a short-code collision a new code
    /// is generated, up to the configured attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is invalid.
    /// Returns [`AppError::GenerationExhausted`] if every attempt collided.
    /// Returns [`AppError::Store`] on store failures, including during the
    /// deduplication lookup.
    pub async fn create(&self, url: &str, owner: OwnerId) -> Result<Link, AppError> {
        let original_url = validate_destination(url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        if let Some(existing) = self
            .bounded(
                "find_by_url_and_owner",
                self.link_repository
                    .find_by_url_and_owner(&original_url, owner),
            )
            .await?
        {
            debug!(link_id = existing.id, %owner, "Returning existing link");
            return Ok(existing);
        }

        for attempt in 1..=self.max_code_attempts {
            let new_link = NewLink {
                original_url: original_url.clone(),
                short_code: generate_code()?,
                owner_id: owner,
            };

            match self
                .bounded(
                    "create_with_owner",
                    self.link_repository.create_with_owner(new_link),
                )
                .await
            {
                Ok(link) => {
                    info!(link_id = link.id, short_code = %link.short_code, %owner, "Link created");
                    return Ok(link);
                }
                Err(AppError::DuplicateCode { .. }) => {
                    warn!(attempt, "Short code collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::generation_exhausted(
            "Failed to generate a unique short code",
            json!({ "attempts": self.max_code_attempts }),
        ))
    }

    /// Returns a link if `owner` holds it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    /// Returns [`AppError::AccessDenied`] if the link belongs to someone else.
    pub async fn get_owned(&self, id: i64, owner: OwnerId) -> Result<Link, AppError> {
        let link = self
            .bounded("find_by_id", self.link_repository.find_by_id(id))
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if !link.is_owned_by(owner) {
            warn!(link_id = id, %owner, "Access to foreign link denied");
            return Err(AppError::access_denied(
                "Access denied",
                json!({ "id": id }),
            ));
        }

        Ok(link)
    }

    /// Lists the owner's links, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on store failures.
    pub async fn list_owned(&self, owner: OwnerId) -> Result<Vec<Link>, AppError> {
        self.bounded("find_by_owner", self.link_repository.find_by_owner(owner))
            .await
    }

    /// Applies typed changes to a link held by `owner`.
    ///
    /// The ownership check runs before anything is validated or written.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the change set is empty or a value is invalid.
    /// Returns [`AppError::InvalidField`] if a field repeats or the click count would decrease.
    /// Returns [`AppError::NotFound`] / [`AppError::AccessDenied`] as [`Self::get_owned`].
    /// Returns [`AppError::DuplicateCode`] if the new short code is taken.
    pub async fn update_owned(
        &self,
        id: i64,
        owner: OwnerId,
        changes: Vec<LinkChange>,
    ) -> Result<Link, AppError> {
        let current = self.get_owned(id, owner).await?;

        if changes.is_empty() {
            return Err(AppError::bad_request(
                "No fields to update",
                json!({ "id": id }),
            ));
        }

        let changes = Self::validate_changes(&current, changes)?;

        let updated = self
            .bounded(
                "update_fields",
                self.link_repository.update_fields(id, changes),
            )
            .await?;

        info!(link_id = id, %owner, "Link updated");
        Ok(updated)
    }

    /// Deletes a link and its owner association.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AccessDenied`] if the link belongs to someone else.
    /// Returns [`AppError::NotFound`] if no link has this id.
    /// Nothing is deleted in either case.
    pub async fn delete_owned(&self, id: i64, owner: OwnerId) -> Result<(), AppError> {
        match self
            .bounded(
                "delete_if_owned",
                self.link_repository.delete_if_owned(id, owner),
            )
            .await
        {
            Ok(()) => {
                info!(link_id = id, %owner, "Link deleted");
                Ok(())
            }
            Err(AppError::AccessDenied { message, details }) => {
                let exists = self
                    .bounded("find_by_id", self.link_repository.find_by_id(id))
                    .await?
                    .is_some();

                if exists {
                    warn!(link_id = id, %owner, "Delete of foreign link denied");
                    Err(AppError::AccessDenied { message, details })
                } else {
                    Err(AppError::not_found("Link not found", json!({ "id": id })))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves a short code for the public redirect path. No ownership check.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is unknown.
    pub async fn resolve_by_code(&self, code: &str) -> Result<Link, AppError> {
        self.bounded("find_by_code", self.link_repository.find_by_code(code))
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "short_code": code }))
            })
    }

    /// Records one visit and returns the new click count.
    ///
    /// The store increments atomically; `observed_count` is the value read at
    /// resolve time and is only used to detect visits that raced with this one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link disappeared.
    /// Returns [`AppError::Store`] on store failures.
    pub async fn record_visit(&self, id: i64, observed_count: i64) -> Result<i64, AppError> {
        let new_count = self
            .bounded("increment_clicks", self.link_repository.increment_clicks(id))
            .await?;

        if observed_count
            .checked_add(1)
            .is_some_and(|expected| new_count > expected)
        {
            debug!(
                link_id = id,
                observed_count, new_count, "Concurrent visits recorded"
            );
        }

        Ok(new_count)
    }

    /// Checks that the store answers within the timeout.
    pub async fn health_check(&self) -> Result<(), AppError> {
        self.bounded("ping", self.link_repository.ping()).await
    }

    fn validate_changes(
        current: &Link,
        changes: Vec<LinkChange>,
    ) -> Result<Vec<LinkChange>, AppError> {
        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(changes.len());

        for change in changes {
            let field = change.field();
            if !seen.insert(field) {
                return Err(AppError::invalid_field(
                    format!("Field '{field}' given more than once"),
                    json!({ "field": field.as_str() }),
                ));
            }

            let change = match change {
                LinkChange::OriginalUrl(url) => {
                    LinkChange::OriginalUrl(validate_destination(&url).map_err(|e| {
                        AppError::bad_request(
                            "Invalid URL format",
                            json!({ "reason": e.to_string() }),
                        )
                    })?)
                }
                LinkChange::ShortCode(code) => {
                    validate_short_code(&code)?;
                    LinkChange::ShortCode(code)
                }
                LinkChange::ClickCount(count) => {
                    if count < current.click_count {
                        return Err(AppError::invalid_field(
                            "click_count cannot decrease",
                            json!({ "current": current.click_count, "requested": count }),
                        ));
                    }
                    LinkChange::ClickCount(count)
                }
            };

            validated.push(change);
        }

        Ok(validated)
    }

    /// Runs a store call under the configured timeout.
    ///
    /// A timed-out future is dropped, which rolls back any open transaction.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .map_err(|_| {
                warn!(operation, "Store call timed out");
                AppError::store(
                    "Store call timed out",
                    json!({
                        "operation": operation,
                        "timeout_ms": self.store_timeout.as_millis() as u64,
                    }),
                )
            })?
    }
}
