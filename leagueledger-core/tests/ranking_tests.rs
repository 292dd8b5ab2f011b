// File: leagueledger-core/tests/ranking_tests.rs

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use leagueledger_core::models::{RankWindow, TokenSpec};
use leagueledger_core::services::RedemptionPolicy;
use leagueledger_core::test_utils::helpers::memory_ledger;
use leagueledger_core::traits::api::{StandingsApi, TokenSetApi};
use leagueledger_core::traits::directory_traits::FixedIdentity;
use leagueledger_core::{Error, LeagueLedger};

/// Redeems a fresh token worth `points` for `team` at `at`.
async fn award(
    ledger: &LeagueLedger,
    user: Uuid,
    team: Uuid,
    points: Decimal,
    at: DateTime<Utc>,
) -> Result<(), Error> {
    let token = ledger.issue_token(TokenSpec::points(points)).await?;
    ledger
        .redemption_service
        .redeem_at(user, &token.code, team, at)
        .await
        .map_err(|e| Error::Validation(e.to_string()))?;
    Ok(())
}

#[tokio::test]
async fn test_ties_share_rank_and_next_rank_skips() -> Result<(), Error> {
    let (ledger, _store, directory) = memory_ledger(RedemptionPolicy::default());
    let user = Uuid::new_v4();
    let teams: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    for t in &teams {
        directory.add_member(*t, user);
    }
    let now = Utc::now();
    for (team, points) in teams.iter().zip([30, 30, 10, 5]) {
        award(&ledger, user, *team, Decimal::from(points), now).await?;
    }

    let table = ledger.rank(RankWindow::All, false).await?;
    let ranks: Vec<u32> = table.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, vec![1, 1, 3, 4]);

    // Single-team rank agrees with the table.
    for standing in &table {
        let single = ledger.team_rank(standing.team_id, RankWindow::All).await?;
        assert_eq!(single.rank, standing.rank);
        assert_eq!(single.points, standing.points);
    }
    Ok(())
}

#[tokio::test]
async fn test_include_all_places_silent_teams_last() -> Result<(), Error> {
    let (ledger, _store, directory) = memory_ledger(RedemptionPolicy::default());
    let user = Uuid::new_v4();
    let active = Uuid::new_v4();
    let silent = Uuid::new_v4();
    directory.add_member(active, user);
    directory.add_team(silent);

    award(&ledger, user, active, Decimal::from(12), Utc::now()).await?;

    let only_active = ledger.rank(RankWindow::All, false).await?;
    assert_eq!(only_active.len(), 1);

    let everyone = ledger.rank(RankWindow::All, true).await?;
    assert_eq!(everyone.len(), 2);
    assert_eq!(everyone[1].team_id, silent);
    assert_eq!(everyone[1].points, Decimal::ZERO);
    assert_eq!(everyone[1].rank, 2);

    let silent_rank = ledger.team_rank(silent, RankWindow::All).await?;
    assert_eq!(silent_rank.rank, 2);
    Ok(())
}

#[tokio::test]
async fn test_podium_keeps_ties_for_third() -> Result<(), Error> {
    let (ledger, _store, directory) = memory_ledger(RedemptionPolicy::default());
    let user = Uuid::new_v4();
    let now = Utc::now();
    for points in [40, 20, 10, 10, 1] {
        let team = Uuid::new_v4();
        directory.add_member(team, user);
        award(&ledger, user, team, Decimal::from(points), now).await?;
    }

    let podium = ledger.podium(RankWindow::All).await?;
    let ranks: Vec<u32> = podium.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 3]);
    Ok(())
}

#[tokio::test]
async fn test_team_summary_splits_month_from_total() -> Result<(), Error> {
    let (ledger, _store, directory) = memory_ledger(RedemptionPolicy::default());
    let user = Uuid::new_v4();
    let team = Uuid::new_v4();
    let rival = Uuid::new_v4();
    directory.add_member(team, user);
    directory.add_member(rival, user);

    let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).single().expect("valid date");
    award(&ledger, user, team, Decimal::new(750, 2), now - Duration::days(20)).await?;
    award(&ledger, user, team, Decimal::new(250, 2), now - Duration::days(10)).await?;
    award(&ledger, user, rival, Decimal::from(25), now - Duration::days(1)).await?;

    let summary = ledger.ranking_service.team_summary_at(team, now).await?;
    assert_eq!(summary.total_points, Decimal::from(10));
    assert_eq!(summary.points_this_month, Decimal::new(250, 2));
    assert_eq!(summary.rank, 2);
    assert!(summary.achievements.is_empty());

    let missing = ledger.team_summary(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_member_overview_sums_teams_and_picks_best_rank() -> Result<(), Error> {
    let (ledger, _store, directory) = memory_ledger(RedemptionPolicy::default());
    let user = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    let mine_a = Uuid::new_v4();
    let mine_b = Uuid::new_v4();
    let theirs = Uuid::new_v4();
    directory.add_member(mine_a, user);
    directory.add_member(mine_b, user);
    directory.add_member(theirs, other_user);

    let now = Utc::now();
    award(&ledger, user, mine_a, Decimal::from(5), now).await?;
    award(&ledger, user, mine_b, Decimal::from(15), now).await?;
    award(&ledger, other_user, theirs, Decimal::from(30), now).await?;

    let overview = ledger.member_overview(&FixedIdentity(user)).await?;
    assert_eq!(overview.teams.len(), 2);
    assert_eq!(overview.total_points, Decimal::from(20));
    assert_eq!(overview.best_rank, Some(2));

    let loner = ledger.member_overview(&FixedIdentity(Uuid::new_v4())).await?;
    assert!(loner.teams.is_empty());
    assert_eq!(loner.best_rank, None);
    Ok(())
}
