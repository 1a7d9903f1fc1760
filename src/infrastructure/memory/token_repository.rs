//! In-memory implementation of token repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;

use crate::domain::entities::OwnerId;
use crate::domain::repositories::{ApiToken, TokenRepository};
use crate::error::AppError;

/// Token repository backed by process memory.
#[derive(Default)]
pub struct MemoryTokenRepository {
    tokens: Mutex<Vec<ApiToken>>,
}

impl MemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn find_owner(&self, token_hash: &str) -> Result<Option<OwnerId>, AppError> {
        let tokens = self.tokens.lock().await;

        Ok(tokens
            .iter()
            .find(|t| t.token_hash == token_hash && t.is_active())
            .map(|t| t.owner_id))
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().await;

        if let Some(token) = tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && t.is_active())
        {
            token.last_used_at = Some(Utc::now());
        }

        Ok(())
    }

    async fn create_token(
        &self,
        owner: OwnerId,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let mut tokens = self.tokens.lock().await;

        if tokens.iter().any(|t| t.token_hash == token_hash) {
            return Err(AppError::store(
                "Token hash already exists",
                json!({ "name": name }),
            ));
        }

        let token = ApiToken {
            id: tokens.len() as i64 + 1,
            owner_id: owner,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };
        tokens.push(token.clone());

        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().rev().find(|t| t.name == name).cloned())
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        let mut tokens = self.tokens.lock().await;

        let token = tokens
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::not_found("Token not found", json!({ "token_id": id })))?;

        token.revoked_at.get_or_insert_with(Utc::now);

        Ok(())
    }
}
