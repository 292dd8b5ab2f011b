// File: leagueledger-core/src/services/token_set_service.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::Error;
use crate::models::{Token, TokenSet, TokenSetDetail, TokenSpec};
use crate::repositories::{TokenRepository, TokenSetRepository};
use crate::services::token_service::TokenService;

/// Named batches of tokens and their retroactive event link.
pub struct TokenSetService {
    sets: Arc<dyn TokenSetRepository>,
    tokens: Arc<dyn TokenRepository>,
    issuer: Arc<TokenService>,
}

impl TokenSetService {
    pub fn new(
        sets: Arc<dyn TokenSetRepository>,
        tokens: Arc<dyn TokenRepository>,
        issuer: Arc<TokenService>,
    ) -> Self {
        Self { sets, tokens, issuer }
    }

    pub async fn create_set(&self, name: &str, description: Option<&str>) -> Result<TokenSet, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("set name must not be empty".into()));
        }
        let set = TokenSet {
            set_id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
            created_at: Utc::now(),
        };
        self.sets.create_set(&set).await?;
        info!("Created token set {} ('{}')", set.set_id, set.name);
        Ok(set)
    }

    pub async fn add_token_to_set(&self, set_id: Uuid, spec: TokenSpec) -> Result<Token, Error> {
        self.require_set(set_id).await?;
        self.issuer.issue_in_set(spec, Some(set_id)).await
    }

    /// `quantity` tokens from one spec, inserted together or not at all.
    pub async fn issue_batch(
        &self,
        set_id: Uuid,
        spec: TokenSpec,
        quantity: u32,
    ) -> Result<Vec<Token>, Error> {
        self.require_set(set_id).await?;
        self.issuer.issue_tokens(spec, Some(set_id), quantity).await
    }

    /// Stamps `event_id` on tokens of the set that have none. Facts already
    /// written keep the event id they captured.
    pub async fn link_set_to_event(&self, set_id: Uuid, event_id: Uuid) -> Result<u64, Error> {
        self.require_set(set_id).await?;
        let updated = self.tokens.link_set_to_event(set_id, event_id).await?;
        info!("Linked {} tokens of set {} to event {}", updated, set_id, event_id);
        Ok(updated)
    }

    pub async fn list_sets(&self) -> Result<Vec<TokenSet>, Error> {
        self.sets.list_sets().await
    }

    pub async fn get_set(&self, set_id: Uuid) -> Result<TokenSetDetail, Error> {
        let set = self.require_set(set_id).await?;
        let tokens = self.tokens_in_set(set_id).await?;
        Ok(TokenSetDetail { set, tokens })
    }

    pub async fn tokens_in_set(&self, set_id: Uuid) -> Result<Vec<Token>, Error> {
        self.tokens.list_tokens_for_set(set_id).await
    }

    async fn require_set(&self, set_id: Uuid) -> Result<TokenSet, Error> {
        self.sets
            .get_set(set_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("token set {set_id}")))
    }
}
