#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::json;
use shortlink::application::services::auth_service::hash_token;
use shortlink::domain::entities::{Link, LinkChange, NewLink, OwnerId};
use shortlink::domain::repositories::{LinkRepository, TokenRepository};
use shortlink::error::AppError;
use shortlink::infrastructure::memory::{MemoryLinkRepository, MemoryTokenRepository};
use shortlink::routes::router;
use shortlink::state::{AppState, ServiceSettings};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "https://s.example.com";

/// Token of owner 7.
pub const ALICE_TOKEN: &str = "alice-token";
pub const ALICE: OwnerId = OwnerId(7);

/// Token of owner 9.
pub const BOB_TOKEN: &str = "bob-token";
pub const BOB: OwnerId = OwnerId(9);

pub const REVOKED_TOKEN: &str = "revoked-token";

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn create_token_repo() -> Arc<MemoryTokenRepository> {
    let repo = Arc::new(MemoryTokenRepository::new());

    for (owner, name, token) in [(ALICE, "alice", ALICE_TOKEN), (BOB, "bob", BOB_TOKEN)] {
        repo.create_token(owner, name, &hash_token(SIGNING_SECRET, token))
            .await
            .unwrap();
    }

    let revoked = repo
        .create_token(ALICE, "old", &hash_token(SIGNING_SECRET, REVOKED_TOKEN))
        .await
        .unwrap();
    repo.revoke_token(revoked.id).await.unwrap();

    repo
}

pub async fn create_test_state(link_repo: Arc<dyn LinkRepository>) -> AppState {
    AppState::new(
        link_repo,
        create_token_repo().await,
        ServiceSettings::new(BASE_URL, SIGNING_SECRET),
    )
}

/// Full router over a fresh in-memory store.
pub async fn make_server() -> (TestServer, Arc<MemoryLinkRepository>) {
    let link_repo = Arc::new(MemoryLinkRepository::new());
    let state = create_test_state(link_repo.clone()).await;

    (TestServer::new(router(state)).unwrap(), link_repo)
}

/// Full router over an arbitrary link repository.
pub async fn make_server_with(link_repo: Arc<dyn LinkRepository>) -> TestServer {
    let state = create_test_state(link_repo).await;
    TestServer::new(router(state)).unwrap()
}

pub async fn create_test_link(repo: &MemoryLinkRepository, url: &str, code: &str, owner: OwnerId) -> Link {
    repo.create_with_owner(NewLink {
        original_url: url.to_string(),
        short_code: code.to_string(),
        owner_id: owner,
    })
    .await
    .unwrap()
}

fn store_error() -> AppError {
    AppError::store("Database error", json!({ "reason": "connection refused" }))
}

/// A link store whose every call fails, like an unreachable database.
pub struct UnavailableLinkRepository;

#[async_trait]
impl LinkRepository for UnavailableLinkRepository {
    async fn create_with_owner(&self, _new_link: NewLink) -> Result<Link, AppError> {
        Err(store_error())
    }
    async fn find_by_id(&self, _id: i64) -> Result<Option<Link>, AppError> {
        Err(store_error())
    }
    async fn find_by_owner(&self, _owner: OwnerId) -> Result<Vec<Link>, AppError> {
        Err(store_error())
    }
    async fn find_by_url_and_owner(
        &self,
        _url: &str,
        _owner: OwnerId,
    ) -> Result<Option<Link>, AppError> {
        Err(store_error())
    }
    async fn find_by_code(&self, _code: &str) -> Result<Option<Link>, AppError> {
        Err(store_error())
    }
    async fn update_fields(&self, _id: i64, _changes: Vec<LinkChange>) -> Result<Link, AppError> {
        Err(store_error())
    }
    async fn increment_clicks(&self, _id: i64) -> Result<i64, AppError> {
        Err(store_error())
    }
    async fn delete_if_owned(&self, _id: i64, _owner: OwnerId) -> Result<(), AppError> {
        Err(store_error())
    }
    async fn ping(&self) -> Result<(), AppError> {
        Err(store_error())
    }
}

/// Delegates to an in-memory store but fails every click increment.
pub struct FailingCounterRepository {
    pub inner: Arc<MemoryLinkRepository>,
    pub increment_attempts: AtomicUsize,
}

impl FailingCounterRepository {
    pub fn new(inner: Arc<MemoryLinkRepository>) -> Self {
        Self {
            inner,
            increment_attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.increment_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkRepository for FailingCounterRepository {
    async fn create_with_owner(&self, new_link: NewLink) -> Result<Link, AppError> {
        self.inner.create_with_owner(new_link).await
    }
    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        self.inner.find_by_id(id).await
    }
    async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<Link>, AppError> {
        self.inner.find_by_owner(owner).await
    }
    async fn find_by_url_and_owner(
        &self,
        url: &str,
        owner: OwnerId,
    ) -> Result<Option<Link>, AppError> {
        self.inner.find_by_url_and_owner(url, owner).await
    }
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        self.inner.find_by_code(code).await
    }
    async fn update_fields(&self, id: i64, changes: Vec<LinkChange>) -> Result<Link, AppError> {
        self.inner.update_fields(id, changes).await
    }
    async fn increment_clicks(&self, _id: i64) -> Result<i64, AppError> {
        self.increment_attempts.fetch_add(1, Ordering::SeqCst);
        Err(store_error())
    }
    async fn delete_if_owned(&self, id: i64, owner: OwnerId) -> Result<(), AppError> {
        self.inner.delete_if_owned(id, owner).await
    }
    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}

pub async fn create_test_user(pool: &sqlx::PgPool, email: &str) -> OwnerId {
    let id: i64 = sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap();
    OwnerId(id)
}
