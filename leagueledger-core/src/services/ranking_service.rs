// File: leagueledger-core/src/services/ranking_service.rs
//
// Read-only aggregation over the ledger. Nothing is cached; every call
// recomputes from facts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::Error;
use crate::models::{
    add_points, assign_competition_ranks, start_of_month, with_universe, MemberOverview, RankWindow,
    TeamStanding, TeamSummary,
};
use crate::repositories::{LedgerRepository, TeamDirectory};

pub const PODIUM_PLACES: u32 = 3;

pub struct RankingService {
    ledger: Arc<dyn LedgerRepository>,
    directory: Arc<dyn TeamDirectory>,
}

impl RankingService {
    pub fn new(ledger: Arc<dyn LedgerRepository>, directory: Arc<dyn TeamDirectory>) -> Self {
        Self { ledger, directory }
    }

    /// Teams with at least one fact in the window, in competition-rank order.
    pub async fn rank(&self, window: RankWindow) -> Result<Vec<TeamStanding>, Error> {
        self.rank_at(window, Utc::now()).await
    }

    pub async fn rank_at(
        &self,
        window: RankWindow,
        now: DateTime<Utc>,
    ) -> Result<Vec<TeamStanding>, Error> {
        let totals = self.ledger.team_totals(window.since(now)).await?;
        debug!("Ranking {} teams for window {}", totals.len(), window);
        Ok(assign_competition_ranks(totals))
    }

    /// Like `rank`, but every team in `team_ids` appears, at zero points if
    /// it has no facts in the window.
    pub async fn rank_including(
        &self,
        window: RankWindow,
        team_ids: &[Uuid],
    ) -> Result<Vec<TeamStanding>, Error> {
        self.rank_including_at(window, team_ids, Utc::now()).await
    }

    pub async fn rank_including_at(
        &self,
        window: RankWindow,
        team_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<TeamStanding>, Error> {
        let totals = self.ledger.team_totals(window.since(now)).await?;
        Ok(assign_competition_ranks(with_universe(totals, team_ids)))
    }

    /// Every directory team, zero-point teams included.
    pub async fn rank_all_teams(&self, window: RankWindow) -> Result<Vec<TeamStanding>, Error> {
        let universe = self.directory.list_team_ids().await?;
        self.rank_including(window, &universe).await
    }

    /// Standings ranked 1 through 3. Ties can make this longer than three.
    pub async fn podium(&self, window: RankWindow) -> Result<Vec<TeamStanding>, Error> {
        let mut standings = self.rank(window).await?;
        standings.retain(|s| s.rank <= PODIUM_PLACES);
        Ok(standings)
    }

    /// One team's standing without building the table:
    /// 1 + number of teams with strictly more points in the window.
    pub async fn team_rank(&self, team_id: Uuid, window: RankWindow) -> Result<TeamStanding, Error> {
        self.team_rank_at(team_id, window, Utc::now()).await
    }

    pub async fn team_rank_at(
        &self,
        team_id: Uuid,
        window: RankWindow,
        now: DateTime<Utc>,
    ) -> Result<TeamStanding, Error> {
        let since = window.since(now);
        let points = self.ledger.points_for_team(team_id, since).await?;
        let above = self.ledger.count_teams_above(points, since).await?;
        let rank = u32::try_from(above + 1)
            .map_err(|_| Error::Validation(format!("rank out of range: {}", above + 1)))?;
        Ok(TeamStanding { team_id, points, rank })
    }

    pub async fn team_summary(&self, team_id: Uuid) -> Result<TeamSummary, Error> {
        self.team_summary_at(team_id, Utc::now()).await
    }

    pub async fn team_summary_at(
        &self,
        team_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<TeamSummary, Error> {
        if !self.directory.team_exists(team_id).await? {
            return Err(Error::NotFound(format!("team {team_id}")));
        }
        let standing = self.team_rank_at(team_id, RankWindow::All, now).await?;
        let points_this_month = self
            .ledger
            .points_for_team(team_id, Some(start_of_month(now)))
            .await?;
        let achievements = self.ledger.achievements_for_team(team_id).await?;

        Ok(TeamSummary {
            team_id,
            total_points: standing.points,
            points_this_month,
            rank: standing.rank,
            achievements,
        })
    }

    /// All-time standing of every team `user_id` belongs to.
    pub async fn member_overview(&self, user_id: Uuid) -> Result<MemberOverview, Error> {
        let now = Utc::now();
        let mut teams = Vec::new();
        for team_id in self.directory.teams_for_user(user_id).await? {
            teams.push(self.team_rank_at(team_id, RankWindow::All, now).await?);
        }
        let total_points = teams
            .iter()
            .try_fold(Decimal::ZERO, |acc, t| add_points(acc, t.points))?;
        let best_rank = teams.iter().map(|t| t.rank).min();

        Ok(MemberOverview { user_id, teams, total_points, best_rank })
    }
}
