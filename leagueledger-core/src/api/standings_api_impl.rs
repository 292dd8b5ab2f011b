//! api/standings_api_impl.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::Error;
use crate::api::LeagueLedger;
use crate::models::{MemberOverview, RankWindow, TeamStanding, TeamSummary};
use crate::traits::api::StandingsApi;
use crate::traits::directory_traits::IdentityProvider;

#[async_trait]
impl StandingsApi for LeagueLedger {
    async fn rank(
        &self,
        window: RankWindow,
        include_all_teams: bool,
    ) -> Result<Vec<TeamStanding>, Error> {
        if include_all_teams {
            self.ranking_service.rank_all_teams(window).await
        } else {
            self.ranking_service.rank(window).await
        }
    }

    async fn podium(&self, window: RankWindow) -> Result<Vec<TeamStanding>, Error> {
        self.ranking_service.podium(window).await
    }

    async fn team_rank(&self, team_id: Uuid, window: RankWindow) -> Result<TeamStanding, Error> {
        self.ranking_service.team_rank(team_id, window).await
    }

    async fn team_summary(&self, team_id: Uuid) -> Result<TeamSummary, Error> {
        self.ranking_service.team_summary(team_id).await
    }

    async fn member_overview(
        &self,
        identity: &dyn IdentityProvider,
    ) -> Result<MemberOverview, Error> {
        let user_id = identity.current_user()?;
        self.ranking_service.member_overview(user_id).await
    }
}
