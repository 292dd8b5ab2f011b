use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{
    AchievementGrant, ConsumeOutcome, RedemptionFact, TeamPoints, Token, TokenSet,
};

/// Durable token records plus the conditional consume.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create_token(&self, token: &Token) -> Result<(), Error>;

    /// Inserts all tokens or none of them.
    async fn create_tokens(&self, tokens: &[Token]) -> Result<(), Error>;

    async fn get_token_by_id(&self, token_id: Uuid) -> Result<Option<Token>, Error>;
    async fn get_token_by_code(&self, code: &str) -> Result<Option<Token>, Error>;

    /// Tokens of a set in creation order.
    async fn list_tokens_for_set(&self, set_id: Uuid) -> Result<Vec<Token>, Error>;

    /// Increments `use_count` iff it still equals `expected_use_count`, the token
    /// has headroom and is not expired at `now`. One atomic step, never a
    /// read-then-write. Unknown ids yield `Error::NotFound`.
    async fn try_consume(
        &self,
        token_id: Uuid,
        expected_use_count: i32,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, Error>;

    /// Sets `event_id` on every token of the set that has none yet.
    /// Returns how many tokens were updated.
    async fn link_set_to_event(&self, set_id: Uuid, event_id: Uuid) -> Result<u64, Error>;
}

#[async_trait]
pub trait TokenSetRepository: Send + Sync {
    async fn create_set(&self, set: &TokenSet) -> Result<(), Error>;
    async fn get_set(&self, set_id: Uuid) -> Result<Option<TokenSet>, Error>;
    async fn list_sets(&self) -> Result<Vec<TokenSet>, Error>;
}

/// Read side of the append-only redemption ledger.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn points_for_team(
        &self,
        team_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Decimal, Error>;

    /// Non-null achievement grants, in redemption order.
    async fn achievements_for_team(&self, team_id: Uuid) -> Result<Vec<AchievementGrant>, Error>;

    /// One entry per team with at least one fact at or after `since`.
    async fn team_totals(&self, since: Option<DateTime<Utc>>) -> Result<Vec<TeamPoints>, Error>;

    /// Distinct teams whose windowed total is strictly greater than `points`.
    async fn count_teams_above(
        &self,
        points: Decimal,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, Error>;

    /// Facts of one token ordered by `use_ordinal`.
    async fn facts_for_token(&self, token_id: Uuid) -> Result<Vec<RedemptionFact>, Error>;

    /// Newest first.
    async fn recent_facts_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RedemptionFact>, Error>;
}

/// The redemption unit of work: conditional consume and fact append commit
/// together or not at all.
#[async_trait]
pub trait RedemptionStore: Send + Sync {
    /// Consumes `fact.token_id` expecting `expected_use_count`; on success the
    /// fact is appended in the same transaction. Any `Err` leaves the token
    /// untouched.
    async fn consume_and_record(
        &self,
        expected_use_count: i32,
        now: DateTime<Utc>,
        fact: &RedemptionFact,
    ) -> Result<ConsumeOutcome, Error>;
}
