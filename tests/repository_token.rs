//! PostgreSQL token repository tests.
//!
//! Requires `DATABASE_URL` pointing at a PostgreSQL server.

mod common;

use sqlx::PgPool;
use std::sync::Arc;
use shortlink::domain::repositories::TokenRepository;
use shortlink::error::AppError;
use shortlink::infrastructure::persistence::PgTokenRepository;

#[sqlx::test]
async fn test_create_token(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo.create_token(owner, "ci", "hash123").await.unwrap();

    assert_eq!(token.name, "ci");
    assert_eq!(token.owner_id, owner);
    assert_eq!(token.token_hash, "hash123");
    assert!(token.is_active());
    assert!(token.last_used_at.is_none());
}

#[sqlx::test]
async fn test_find_owner(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgTokenRepository::new(Arc::new(pool));
    repo.create_token(owner, "ci", "validhash").await.unwrap();

    assert_eq!(repo.find_owner("validhash").await.unwrap(), Some(owner));
    assert_eq!(repo.find_owner("nonexistent").await.unwrap(), None);
}

#[sqlx::test]
async fn test_revoked_token_has_no_owner(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo.create_token(owner, "old", "revokedhash").await.unwrap();
    repo.revoke_token(token.id).await.unwrap();

    assert_eq!(repo.find_owner("revokedhash").await.unwrap(), None);
    assert!(!repo.find_by_id(token.id).await.unwrap().unwrap().is_active());
}

#[sqlx::test]
async fn test_revoke_missing_token(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let result = repo.revoke_token(999).await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
async fn test_update_last_used(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgTokenRepository::new(Arc::new(pool));
    repo.create_token(owner, "cli", "usedhash").await.unwrap();

    repo.update_last_used("usedhash").await.unwrap();

    let token = repo.find_by_name("cli").await.unwrap().unwrap();
    assert!(token.last_used_at.is_some());
}

#[sqlx::test]
async fn test_list_tokens(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgTokenRepository::new(Arc::new(pool));
    repo.create_token(owner, "one", "h1").await.unwrap();
    repo.create_token(owner, "two", "h2").await.unwrap();

    let tokens = repo.list_tokens().await.unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].name, "two");
}
