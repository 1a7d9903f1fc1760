//! End-to-end behaviour of the link service over the in-memory store.

use shortlink::application::services::{LinkService, RedirectOutcome, RedirectService};
use shortlink::domain::entities::{LinkChange, OwnerId};
use shortlink::domain::repositories::LinkRepository;
use shortlink::error::AppError;
use shortlink::infrastructure::memory::MemoryLinkRepository;
use shortlink::utils::code_generator::ALPHABET;
use std::sync::Arc;

fn service() -> (Arc<LinkService<MemoryLinkRepository>>, Arc<MemoryLinkRepository>) {
    let repo = Arc::new(MemoryLinkRepository::new());
    (Arc::new(LinkService::new(repo.clone())), repo)
}

#[tokio::test]
async fn test_create_resolve_visit_and_foreign_delete() {
    let (service, _repo) = service();

    let link = service
        .create("https://example.com", OwnerId(7))
        .await
        .unwrap();
    assert_eq!(link.short_code.len(), 5);
    assert!(link.short_code.bytes().all(|b| ALPHABET.contains(&b)));
    assert_eq!(link.click_count, 0);
    assert_eq!(link.owner_id, OwnerId(7));

    let again = service
        .create("https://example.com", OwnerId(7))
        .await
        .unwrap();
    assert_eq!(again.id, link.id);

    let resolved = service.resolve_by_code(&link.short_code).await.unwrap();
    assert_eq!(resolved, link);

    assert_eq!(service.record_visit(link.id, 0).await.unwrap(), 1);

    let denied = service.delete_owned(link.id, OwnerId(9)).await;
    assert!(matches!(denied, Err(AppError::AccessDenied { .. })));

    assert!(service.resolve_by_code(&link.short_code).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_visits_are_all_counted() {
    let (service, repo) = service();
    let link = service
        .create("https://example.com/hot", OwnerId(1))
        .await
        .unwrap();

    let visits = 50;
    let handles: Vec<_> = (0..visits)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.record_visit(link.id, 0).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = repo.find_by_id(link.id).await.unwrap().unwrap();
    assert_eq!(stored.click_count, visits);
}

#[tokio::test]
async fn test_concurrent_redirects_are_all_counted() {
    let (service, repo) = service();
    let redirect = Arc::new(RedirectService::new(service.clone()));
    let link = service
        .create("https://example.com/burst", OwnerId(1))
        .await
        .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let redirect = redirect.clone();
            let code = link.short_code.clone();
            tokio::spawn(async move { redirect.resolve(&code).await })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(matches!(outcome, RedirectOutcome::Resolved { .. }));
    }

    assert_eq!(
        repo.find_by_id(link.id).await.unwrap().unwrap().click_count,
        20
    );
}

#[tokio::test]
async fn test_non_owner_cannot_mutate() {
    let (service, repo) = service();
    let link = service
        .create("https://example.com/mine", OwnerId(7))
        .await
        .unwrap();

    let get = service.get_owned(link.id, OwnerId(9)).await;
    let update = service
        .update_owned(
            link.id,
            OwnerId(9),
            vec![LinkChange::OriginalUrl("https://evil.example".to_string())],
        )
        .await;
    let delete = service.delete_owned(link.id, OwnerId(9)).await;

    assert!(matches!(get, Err(AppError::AccessDenied { .. })));
    assert!(matches!(update, Err(AppError::AccessDenied { .. })));
    assert!(matches!(delete, Err(AppError::AccessDenied { .. })));
    assert_eq!(repo.find_by_id(link.id).await.unwrap().unwrap(), link);
}

#[tokio::test]
async fn test_delete_removes_link_and_association() {
    let (service, repo) = service();
    let link = service
        .create("https://example.com/bye", OwnerId(7))
        .await
        .unwrap();

    service.delete_owned(link.id, OwnerId(7)).await.unwrap();

    assert!(repo.find_by_id(link.id).await.unwrap().is_none());
    assert!(repo.find_by_owner(OwnerId(7)).await.unwrap().is_empty());
    assert!(matches!(
        service.delete_owned(link.id, OwnerId(7)).await,
        Err(AppError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_concurrent_creates_for_same_url_converge() {
    let (service, repo) = service();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create("https://example.com/race", OwnerId(3))
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1);
    assert_eq!(repo.len().await, 1);
}
