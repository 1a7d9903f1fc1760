//! PostgreSQL link repository tests.
//!
//! Requires `DATABASE_URL` pointing at a PostgreSQL server.

mod common;

use sqlx::PgPool;
use std::sync::Arc;
use shortlink::domain::entities::{LinkChange, NewLink, OwnerId};
use shortlink::domain::repositories::LinkRepository;
use shortlink::error::AppError;
use shortlink::infrastructure::persistence::PgLinkRepository;

fn new_link(url: &str, code: &str, owner: OwnerId) -> NewLink {
    NewLink {
        original_url: url.to_string(),
        short_code: code.to_string(),
        owner_id: owner,
    }
}

#[sqlx::test]
async fn test_create_with_owner(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    let link = repo
        .create_with_owner(new_link("https://example.com", "abcde", owner))
        .await
        .unwrap();

    assert_eq!(link.short_code, "abcde");
    assert_eq!(link.owner_id, owner);
    assert_eq!(link.click_count, 0);

    let associations: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_links WHERE short_link_id = $1")
            .bind(link.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(associations, 1);
}

#[sqlx::test]
async fn test_create_returns_existing_for_same_owner_and_url(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let first = repo
        .create_with_owner(new_link("https://example.com", "abcde", owner))
        .await
        .unwrap();
    let second = repo
        .create_with_owner(new_link("https://example.com", "fghij", owner))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(repo.find_by_code("fghij").await.unwrap().is_none());
}

#[sqlx::test]
async fn test_duplicate_code_rolls_back(pool: PgPool) {
    let alice = common::create_test_user(&pool, "a@example.com").await;
    let bob = common::create_test_user(&pool, "b@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    repo.create_with_owner(new_link("https://a.example", "taken", alice))
        .await
        .unwrap();

    let result = repo
        .create_with_owner(new_link("https://b.example", "taken", bob))
        .await;

    assert!(matches!(result, Err(AppError::DuplicateCode { .. })));
    assert!(repo.find_by_owner(bob).await.unwrap().is_empty());

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[sqlx::test]
async fn test_find_by_owner_newest_first(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let other = common::create_test_user(&pool, "b@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let first = repo
        .create_with_owner(new_link("https://1.example", "aaaaa", owner))
        .await
        .unwrap();
    let second = repo
        .create_with_owner(new_link("https://2.example", "bbbbb", owner))
        .await
        .unwrap();
    repo.create_with_owner(new_link("https://3.example", "ccccc", other))
        .await
        .unwrap();

    let links = repo.find_by_owner(owner).await.unwrap();

    let ids: Vec<i64> = links.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[sqlx::test]
async fn test_increment_clicks_is_atomic(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = Arc::new(PgLinkRepository::new(Arc::new(pool)));

    let link = repo
        .create_with_owner(new_link("https://example.com", "hot01", owner))
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.increment_clicks(link.id).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = repo.find_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(stored.click_count, 20);
}

#[sqlx::test]
async fn test_increment_missing_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let result = repo.increment_clicks(12345).await;

    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
async fn test_update_fields(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .create_with_owner(new_link("https://example.com", "abcde", owner))
        .await
        .unwrap();
    repo.increment_clicks(link.id).await.unwrap();

    let updated = repo
        .update_fields(
            link.id,
            vec![
                LinkChange::OriginalUrl("https://new.example".to_string()),
                LinkChange::ShortCode("fresh".to_string()),
                LinkChange::ClickCount(0),
            ],
        )
        .await
        .unwrap();

    assert_eq!(updated.original_url, "https://new.example");
    assert_eq!(updated.short_code, "fresh");
    assert_eq!(updated.click_count, 1, "click_count never decreases");
    assert_eq!(updated.owner_id, owner);
}

#[sqlx::test]
async fn test_update_to_taken_code(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .create_with_owner(new_link("https://a.example", "aaaaa", owner))
        .await
        .unwrap();
    repo.create_with_owner(new_link("https://b.example", "bbbbb", owner))
        .await
        .unwrap();

    let result = repo
        .update_fields(link.id, vec![LinkChange::ShortCode("bbbbb".to_string())])
        .await;

    assert!(matches!(result, Err(AppError::DuplicateCode { .. })));
}

#[sqlx::test]
async fn test_delete_if_owned(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let other = common::create_test_user(&pool, "b@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    let link = repo
        .create_with_owner(new_link("https://example.com", "abcde", owner))
        .await
        .unwrap();

    let denied = repo.delete_if_owned(link.id, other).await;
    assert!(matches!(denied, Err(AppError::AccessDenied { .. })));
    assert!(repo.find_by_id(link.id).await.unwrap().is_some());

    repo.delete_if_owned(link.id, owner).await.unwrap();

    assert!(repo.find_by_id(link.id).await.unwrap().is_none());
    let associations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_links")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(associations, 0);
}

#[sqlx::test]
async fn test_ping(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.ping().await.is_ok());
}

#[sqlx::test]
async fn test_create_for_unknown_owner_is_rejected_without_residue(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool.clone()));

    let result = repo
        .create_with_owner(new_link("https://example.com", "ghost", OwnerId(999_999)))
        .await;

    assert!(matches!(result, Err(AppError::Validation { .. })));
    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_links")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(links, 0);
}

#[sqlx::test]
async fn test_increment_at_maximum_is_a_store_error(pool: PgPool) {
    let owner = common::create_test_user(&pool, "a@example.com").await;
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo
        .create_with_owner(new_link("https://example.com", "maxed", owner))
        .await
        .unwrap();
    repo.update_fields(link.id, vec![LinkChange::ClickCount(i64::MAX)])
        .await
        .unwrap();

    let result = repo.increment_clicks(link.id).await;

    assert!(matches!(result, Err(AppError::Store { .. })));
    let stored = repo.find_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(stored.click_count, i64::MAX);
}
