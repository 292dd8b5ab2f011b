// File: leagueledger-core/src/repositories/postgres/ledger.rs
//
// Read side of redemption_facts, plus the insert used inside the
// redemption transaction. Nothing here updates or deletes a fact.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use leagueledger_common::error::Error;
use leagueledger_common::models::{AchievementGrant, RedemptionFact, TeamPoints};
use leagueledger_common::traits::repository_traits::LedgerRepository;

const FACT_COLUMNS: &str = r#"
    fact_id,
    token_id,
    team_id,
    points_awarded,
    achievement_granted,
    event_id,
    redeemed_at,
    redeemed_by_user_id,
    use_ordinal
"#;

#[derive(Clone)]
pub struct PostgresLedgerRepository {
    pool: Pool<Postgres>,
}

impl PostgresLedgerRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_fact_on(
    conn: &mut PgConnection,
    fact: &RedemptionFact,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO redemption_facts (
            fact_id,
            token_id,
            team_id,
            points_awarded,
            achievement_granted,
            event_id,
            redeemed_at,
            redeemed_by_user_id,
            use_ordinal
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        "#,
    )
        .bind(fact.fact_id)
        .bind(fact.token_id)
        .bind(fact.team_id)
        .bind(fact.points_awarded)
        .bind(&fact.achievement_granted)
        .bind(fact.event_id)
        .bind(fact.redeemed_at)
        .bind(fact.redeemed_by_user_id)
        .bind(fact.use_ordinal)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn points_for_team(
        &self,
        team_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Decimal, Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(points_awarded), 0) AS total
            FROM redemption_facts
            WHERE team_id = $1
              AND ($2::timestamptz IS NULL OR redeemed_at >= $2)
            "#,
        )
            .bind(team_id)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }

    async fn achievements_for_team(&self, team_id: Uuid) -> Result<Vec<AchievementGrant>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT achievement_granted, event_id, redeemed_at
            FROM redemption_facts
            WHERE team_id = $1
              AND achievement_granted IS NOT NULL
            ORDER BY redeemed_at ASC, use_ordinal ASC
            "#,
        )
            .bind(team_id)
            .fetch_all(&self.pool)
            .await?;

        let mut grants = Vec::with_capacity(rows.len());
        for r in rows {
            grants.push(AchievementGrant {
                achievement_name: r.try_get("achievement_granted")?,
                event_id: r.try_get("event_id")?,
                redeemed_at: r.try_get("redeemed_at")?,
            });
        }
        Ok(grants)
    }

    async fn team_totals(&self, since: Option<DateTime<Utc>>) -> Result<Vec<TeamPoints>, Error> {
        let totals = sqlx::query_as::<_, TeamPoints>(
            r#"
            SELECT team_id, COALESCE(SUM(points_awarded), 0) AS points
            FROM redemption_facts
            WHERE ($1::timestamptz IS NULL OR redeemed_at >= $1)
            GROUP BY team_id
            "#,
        )
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(totals)
    }

    async fn count_teams_above(
        &self,
        points: Decimal,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS above
            FROM (
                SELECT team_id
                FROM redemption_facts
                WHERE ($1::timestamptz IS NULL OR redeemed_at >= $1)
                GROUP BY team_id
                HAVING SUM(points_awarded) > $2
            ) AS ahead
            "#,
        )
            .bind(since)
            .bind(points)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("above")?)
    }

    async fn facts_for_token(&self, token_id: Uuid) -> Result<Vec<RedemptionFact>, Error> {
        let sql = format!(
            "SELECT {FACT_COLUMNS} FROM redemption_facts WHERE token_id = $1 ORDER BY use_ordinal ASC"
        );
        let facts = sqlx::query_as::<_, RedemptionFact>(&sql)
            .bind(token_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(facts)
    }

    async fn recent_facts_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RedemptionFact>, Error> {
        let sql = format!(
            r#"
            SELECT {FACT_COLUMNS}
            FROM redemption_facts
            WHERE redeemed_by_user_id = $1
            ORDER BY redeemed_at DESC
            LIMIT $2
            "#
        );
        let facts = sqlx::query_as::<_, RedemptionFact>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(facts)
    }
}
