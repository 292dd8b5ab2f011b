use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, RedemptionError};
use crate::models::{
    MemberOverview, RankWindow, RedemptionFact, RedemptionResult, TeamStanding, TeamSummary,
    Token, TokenPreview, TokenSet, TokenSetDetail, TokenSpec,
};
use crate::traits::directory_traits::IdentityProvider;

/// Everything the presentation layer may call.
pub trait LeagueApi: RedemptionApi + StandingsApi + TokenSetApi {}

impl<T> LeagueApi for T
where
    T: RedemptionApi + StandingsApi + TokenSetApi,
{
    // marker
}

#[async_trait]
pub trait RedemptionApi: Send + Sync {
    async fn redeem(
        &self,
        identity: &dyn IdentityProvider,
        code: &str,
        team_id: Uuid,
    ) -> Result<RedemptionResult, RedemptionError>;

    async fn recent_redemptions(
        &self,
        identity: &dyn IdentityProvider,
        limit: i64,
    ) -> Result<Vec<RedemptionFact>, Error>;

    /// Shows a code's reward and remaining uses without consuming it.
    async fn preview_token(&self, code: &str) -> Result<TokenPreview, Error>;
}

#[async_trait]
pub trait StandingsApi: Send + Sync {
    /// Teams with facts in the window, or every directory team when
    /// `include_all_teams` is set.
    async fn rank(&self, window: RankWindow, include_all_teams: bool)
        -> Result<Vec<TeamStanding>, Error>;
    async fn podium(&self, window: RankWindow) -> Result<Vec<TeamStanding>, Error>;
    async fn team_rank(&self, team_id: Uuid, window: RankWindow) -> Result<TeamStanding, Error>;
    async fn team_summary(&self, team_id: Uuid) -> Result<TeamSummary, Error>;
    async fn member_overview(&self, identity: &dyn IdentityProvider)
        -> Result<MemberOverview, Error>;
}

#[async_trait]
pub trait TokenSetApi: Send + Sync {
    async fn issue_token(&self, spec: TokenSpec) -> Result<Token, Error>;
    async fn create_set(&self, name: &str, description: Option<&str>) -> Result<TokenSet, Error>;
    async fn add_tokens_to_set(
        &self,
        set_id: Uuid,
        spec: TokenSpec,
        quantity: u32,
    ) -> Result<Vec<Token>, Error>;
    async fn link_set_to_event(&self, set_id: Uuid, event_id: Uuid) -> Result<u64, Error>;
    async fn list_sets(&self) -> Result<Vec<TokenSet>, Error>;
    async fn get_set(&self, set_id: Uuid) -> Result<TokenSetDetail, Error>;
}
