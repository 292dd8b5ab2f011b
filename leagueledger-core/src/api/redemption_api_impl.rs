//! api/redemption_api_impl.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::LeagueLedger;
use crate::models::{RedemptionFact, RedemptionResult, TokenPreview};
use crate::traits::api::RedemptionApi;
use crate::traits::directory_traits::IdentityProvider;
use crate::{Error, RedemptionError};

#[async_trait]
impl RedemptionApi for LeagueLedger {
    async fn redeem(
        &self,
        identity: &dyn IdentityProvider,
        code: &str,
        team_id: Uuid,
    ) -> Result<RedemptionResult, RedemptionError> {
        let user_id = identity.current_user()?;
        self.redemption_service.redeem(user_id, code, team_id).await
    }

    async fn recent_redemptions(
        &self,
        identity: &dyn IdentityProvider,
        limit: i64,
    ) -> Result<Vec<RedemptionFact>, Error> {
        let user_id = identity.current_user()?;
        self.ledger_service.recent_redemptions_for_user(user_id, limit).await
    }

    async fn preview_token(&self, code: &str) -> Result<TokenPreview, Error> {
        self.token_service.preview(code).await
    }
}
