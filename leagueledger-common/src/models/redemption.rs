// File: leagueledger-common/src/models/redemption.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::Token;

/// One successful redemption. Written once, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RedemptionFact {
    pub fact_id: Uuid,
    pub token_id: Uuid,
    pub team_id: Uuid,
    pub points_awarded: Decimal,
    pub achievement_granted: Option<String>,
    /// Copied from the token at redemption time.
    pub event_id: Option<Uuid>,
    pub redeemed_at: DateTime<Utc>,
    pub redeemed_by_user_id: Uuid,
    /// The token's `use_count` right after this redemption (1-based).
    pub use_ordinal: i32,
}

impl RedemptionFact {
    /// The fact that consuming `token` at its current `use_count` would produce.
    pub fn for_token(
        token: &Token,
        team_id: Uuid,
        redeemed_by_user_id: Uuid,
        redeemed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            fact_id: Uuid::new_v4(),
            token_id: token.token_id,
            team_id,
            points_awarded: token.awarded_points(),
            achievement_granted: token.achievement_name.clone(),
            event_id: token.event_id,
            redeemed_at,
            redeemed_by_user_id,
            use_ordinal: token.use_count + 1,
        }
    }
}

/// What a caller of `redeem` gets back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionResult {
    pub team_id: Uuid,
    pub points_awarded: Decimal,
    pub achievement_granted: Option<String>,
    pub remaining_uses: i32,
    pub redeemed_at: DateTime<Utc>,
}

impl RedemptionResult {
    pub fn from_fact(fact: &RedemptionFact, consumed: &Token) -> Self {
        Self {
            team_id: fact.team_id,
            points_awarded: fact.points_awarded,
            achievement_granted: fact.achievement_granted.clone(),
            remaining_uses: consumed.remaining_uses(),
            redeemed_at: fact.redeemed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AchievementGrant {
    pub achievement_name: String,
    pub event_id: Option<Uuid>,
    pub redeemed_at: DateTime<Utc>,
}
