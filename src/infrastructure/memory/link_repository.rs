//! In-memory implementation of link repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::entities::{Link, LinkChange, NewLink, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

#[derive(Default)]
struct State {
    next_id: i64,
    links: HashMap<i64, Link>,
    /// Owner association, kept apart from the link rows.
    owners: HashMap<i64, OwnerId>,
}

impl State {
    fn joined(&self, id: i64) -> Option<Link> {
        let link = self.links.get(&id)?;
        let owner = self.owners.get(&id)?;
        Some(Link {
            owner_id: *owner,
            ..link.clone()
        })
    }

    fn code_taken_by_other(&self, code: &str, id: Option<i64>) -> bool {
        self.links
            .values()
            .any(|link| link.short_code == code && Some(link.id) != id)
    }
}

/// Link repository backed by process memory.
///
/// Every operation takes the state lock once, so each call is atomic with
/// respect to the others.
#[derive(Default)]
pub struct MemoryLinkRepository {
    state: Mutex<State>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links.
    pub async fn len(&self) -> usize {
        self.state.lock().await.links.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create_with_owner(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut state = self.state.lock().await;

        let existing = state
            .owners
            .iter()
            .filter(|(_, owner)| **owner == new_link.owner_id)
            .filter_map(|(id, _)| state.links.get(id))
            .find(|link| link.original_url == new_link.original_url)
            .map(|link| link.id);

        if let Some(link) = existing.and_then(|id| state.joined(id)) {
            return Ok(link);
        }

        if state.code_taken_by_other(&new_link.short_code, None) {
            return Err(AppError::duplicate_code(
                "Short code already exists",
                json!({ "short_code": new_link.short_code }),
            ));
        }

        state.next_id += 1;
        let link = Link::new(
            state.next_id,
            new_link.original_url,
            new_link.short_code,
            new_link.owner_id,
            0,
            Utc::now(),
        );

        state.links.insert(link.id, link.clone());
        state.owners.insert(link.id, link.owner_id);

        Ok(link)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.state.lock().await.joined(id))
    }

    async fn find_by_owner(&self, owner: OwnerId) -> Result<Vec<Link>, AppError> {
        let state = self.state.lock().await;

        let mut links: Vec<Link> = state
            .owners
            .iter()
            .filter(|(_, o)| **o == owner)
            .filter_map(|(id, _)| state.joined(*id))
            .collect();

        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(links)
    }

    async fn find_by_url_and_owner(
        &self,
        url: &str,
        owner: OwnerId,
    ) -> Result<Option<Link>, AppError> {
        let state = self.state.lock().await;

        Ok(state
            .owners
            .iter()
            .filter(|(_, o)| **o == owner)
            .filter_map(|(id, _)| state.joined(*id))
            .find(|link| link.original_url == url))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let state = self.state.lock().await;

        Ok(state
            .links
            .values()
            .find(|link| link.short_code == code)
            .and_then(|link| state.joined(link.id)))
    }

    async fn update_fields(&self, id: i64, changes: Vec<LinkChange>) -> Result<Link, AppError> {
        let mut state = self.state.lock().await;

        let mut updated = state
            .joined(id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        for change in changes {
            match change {
                LinkChange::OriginalUrl(url) => updated.original_url = url,
                LinkChange::ShortCode(code) => {
                    if state.code_taken_by_other(&code, Some(id)) {
                        return Err(AppError::duplicate_code(
                            "Short code already exists",
                            json!({ "short_code": code }),
                        ));
                    }
                    updated.short_code = code;
                }
                LinkChange::ClickCount(count) => {
                    updated.click_count = updated.click_count.max(count);
                }
            }
        }

        state.links.insert(id, updated.clone());

        Ok(updated)
    }

    async fn increment_clicks(&self, id: i64) -> Result<i64, AppError> {
        let mut state = self.state.lock().await;

        let link = state
            .links
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        link.click_count = link.click_count.checked_add(1).ok_or_else(|| {
            AppError::store("Click counter overflow", json!({ "id": id }))
        })?;
        Ok(link.click_count)
    }

    async fn delete_if_owned(&self, id: i64, owner: OwnerId) -> Result<(), AppError> {
        let mut state = self.state.lock().await;

        if state.owners.get(&id) != Some(&owner) {
            return Err(AppError::access_denied(
                "Link not found or access denied",
                json!({ "id": id }),
            ));
        }

        state.owners.remove(&id);
        state.links.remove(&id);

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
