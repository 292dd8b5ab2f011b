use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::Error;
use crate::models::{AchievementGrant, RedemptionFact};
use crate::repositories::LedgerRepository;

/// Point and achievement queries over the fact log. Never writes.
pub struct LedgerService {
    ledger: Arc<dyn LedgerRepository>,
}

impl LedgerService {
    pub fn new(ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { ledger }
    }

    pub async fn points_for_team(
        &self,
        team_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Decimal, Error> {
        self.ledger.points_for_team(team_id, since).await
    }

    pub async fn achievements_for_team(&self, team_id: Uuid) -> Result<Vec<AchievementGrant>, Error> {
        self.ledger.achievements_for_team(team_id).await
    }

    pub async fn facts_for_token(&self, token_id: Uuid) -> Result<Vec<RedemptionFact>, Error> {
        self.ledger.facts_for_token(token_id).await
    }

    pub async fn recent_redemptions_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RedemptionFact>, Error> {
        if limit < 1 {
            return Err(Error::Validation("limit must be at least 1".into()));
        }
        self.ledger.recent_facts_for_user(user_id, limit).await
    }
}
