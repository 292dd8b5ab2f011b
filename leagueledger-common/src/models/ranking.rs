// File: leagueledger-common/src/models/ranking.rs

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::redemption::AchievementGrant;
use crate::error::Error;

/// Longest `LastNDays` window accepted from text, roughly a century.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Time window a leaderboard is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankWindow {
    #[default]
    All,
    LastNDays(u32),
}

impl RankWindow {
    pub const WEEK: RankWindow = RankWindow::LastNDays(7);
    pub const MONTH: RankWindow = RankWindow::LastNDays(30);

    /// Inclusive lower bound on `redeemed_at`, if any. A window reaching
    /// past the earliest representable instant has no lower bound.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            RankWindow::All => None,
            RankWindow::LastNDays(days) => {
                now.checked_sub_signed(Duration::days(i64::from(*days)))
            }
        }
    }
}

impl FromStr for RankWindow {
    type Err = Error;

    /// Accepts `all`, `week`, `month`, `days:N` or a bare day count.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let days = match s.as_str() {
            "" | "all" => return Ok(RankWindow::All),
            "week" => return Ok(RankWindow::WEEK),
            "month" => return Ok(RankWindow::MONTH),
            other => other.strip_prefix("days:").unwrap_or(other),
        };
        let n: u32 = days
            .parse()
            .map_err(|_| Error::Parse(format!("unknown ranking window '{s}'")))?;
        if n == 0 {
            return Err(Error::Parse("ranking window must cover at least one day".into()));
        }
        if n > MAX_WINDOW_DAYS {
            return Err(Error::Parse(format!(
                "ranking window may cover at most {MAX_WINDOW_DAYS} days"
            )));
        }
        Ok(RankWindow::LastNDays(n))
    }
}

impl fmt::Display for RankWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankWindow::All => write!(f, "all"),
            RankWindow::LastNDays(n) => write!(f, "days:{n}"),
        }
    }
}

/// Points summed for one team over some window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamPoints {
    pub team_id: Uuid,
    pub points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: Uuid,
    pub points: Decimal,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_id: Uuid,
    pub total_points: Decimal,
    pub points_this_month: Decimal,
    pub rank: u32,
    pub achievements: Vec<AchievementGrant>,
}

/// Dashboard view of every team a user belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberOverview {
    pub user_id: Uuid,
    pub teams: Vec<TeamStanding>,
    pub total_points: Decimal,
    pub best_rank: Option<u32>,
}

/// Sorts by points descending and assigns standard competition ranks
/// (1,1,3,4): tied teams share a rank and the next distinct score skips
/// past all of them. Ties are listed by team id so the order is stable.
pub fn assign_competition_ranks(mut totals: Vec<TeamPoints>) -> Vec<TeamStanding> {
    totals.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.team_id.cmp(&b.team_id)));

    let mut standings: Vec<TeamStanding> = Vec::with_capacity(totals.len());
    for (idx, tp) in totals.into_iter().enumerate() {
        let rank = match standings.last() {
            Some(prev) if prev.points == tp.points => prev.rank,
            _ => idx as u32 + 1,
        };
        standings.push(TeamStanding { team_id: tp.team_id, points: tp.points, rank });
    }
    standings
}

/// Adds a zero entry for every team in `universe` that has no total yet.
pub fn with_universe(mut totals: Vec<TeamPoints>, universe: &[Uuid]) -> Vec<TeamPoints> {
    let present: HashSet<Uuid> = totals.iter().map(|t| t.team_id).collect();
    let mut seen = HashSet::new();
    for team_id in universe {
        if !present.contains(team_id) && seen.insert(*team_id) {
            totals.push(TeamPoints { team_id: *team_id, points: Decimal::ZERO });
        }
    }
    totals
}

/// Sums two point totals, refusing instead of overflowing.
pub fn add_points(total: Decimal, points: Decimal) -> Result<Decimal, Error> {
    total
        .checked_add(points)
        .ok_or_else(|| Error::Validation("point total out of range".into()))
}

/// First instant of the calendar month containing `now`.
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}
