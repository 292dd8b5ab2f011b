//! api/token_set_api_impl.rs
//!
//! Issuance and batch management. Authorization of issuers happens in front
//! of this layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::Error;
use crate::api::LeagueLedger;
use crate::models::{Token, TokenSet, TokenSetDetail, TokenSpec};
use crate::traits::api::TokenSetApi;

#[async_trait]
impl TokenSetApi for LeagueLedger {
    async fn issue_token(&self, spec: TokenSpec) -> Result<Token, Error> {
        self.token_service.issue_token(spec).await
    }

    async fn create_set(&self, name: &str, description: Option<&str>) -> Result<TokenSet, Error> {
        self.token_set_service.create_set(name, description).await
    }

    async fn add_tokens_to_set(
        &self,
        set_id: Uuid,
        spec: TokenSpec,
        quantity: u32,
    ) -> Result<Vec<Token>, Error> {
        if quantity == 1 {
            let token = self.token_set_service.add_token_to_set(set_id, spec).await?;
            return Ok(vec![token]);
        }
        self.token_set_service.issue_batch(set_id, spec, quantity).await
    }

    async fn link_set_to_event(&self, set_id: Uuid, event_id: Uuid) -> Result<u64, Error> {
        self.token_set_service.link_set_to_event(set_id, event_id).await
    }

    async fn list_sets(&self) -> Result<Vec<TokenSet>, Error> {
        self.token_set_service.list_sets().await
    }

    async fn get_set(&self, set_id: Uuid) -> Result<TokenSetDetail, Error> {
        self.token_set_service.get_set(set_id).await
    }
}
