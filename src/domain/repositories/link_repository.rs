//! Repository trait for link storage and the owner association.

use crate::domain::entities::{Link, LinkChange, NewLink, OwnerId};
use crate::error::AppError;
use async_trait::async_trait;

/// Durable, transactional storage for links and their owner association.
///
/// The association is a separate join record; implementations must create and
/// delete it in the same transaction as the link itself.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryLinkRepository`] - In-process implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Atomically inserts a link and its owner association.
    ///
    /// If the owner already holds a link for the same URL (a concurrent create won
    /// the race), the existing link is returned and nothing is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateCode`] if the short code is already taken.
    /// Returns [`AppError::Store`] on database errors; nothing is persisted.
    async fn create_with_owner(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by id, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Lists an owner's links, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<Link>, AppError>;

    /// Finds the owner's link for an exact destination URL.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors. Callers must not treat an
    /// error as "not found".
    async fn find_by_url_and_owner(
        &self,
        url: &str,
        owner: OwnerId,
    ) -> Result<Option<Link>, AppError>;

    /// Finds a link by its short code. No ownership context.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Applies a set of typed changes to a link in one statement.
    ///
    /// `ClickCount` changes never lower the stored counter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::DuplicateCode`] if a new short code is taken.
    /// Returns [`AppError::Store`] on database errors.
    async fn update_fields(&self, id: i64, changes: Vec<LinkChange>) -> Result<Link, AppError>;

    /// Atomically adds one to the click counter and returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Store`] on database errors.
    async fn increment_clicks(&self, id: i64) -> Result<i64, AppError>;

    /// Deletes a link and its owner association if `owner` holds it.
    ///
    /// The ownership check and both deletions run in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AccessDenied`] if no association matches `(id, owner)`;
    /// nothing is deleted in that case.
    /// Returns [`AppError::Store`] on database errors.
    async fn delete_if_owned(&self, id: i64, owner: OwnerId) -> Result<(), AppError>;

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store cannot be queried.
    async fn ping(&self) -> Result<(), AppError>;
}
