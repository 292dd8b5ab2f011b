// File: leagueledger-core/src/repositories/postgres/team_directory.rs
//
// Read-only adapter over the directory's `teams` / `team_memberships`
// tables. Team management itself lives outside the ledger.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use leagueledger_common::error::Error;
use leagueledger_common::traits::directory_traits::TeamDirectory;

#[derive(Clone)]
pub struct PostgresTeamDirectory {
    pool: Pool<Postgres>,
}

impl PostgresTeamDirectory {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamDirectory for PostgresTeamDirectory {
    async fn team_exists(&self, team_id: Uuid) -> Result<bool, Error> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM teams WHERE team_id = $1) AS present")
            .bind(team_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("present")?)
    }

    async fn is_member(&self, user_id: Uuid, team_id: Uuid) -> Result<bool, Error> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM team_memberships
                WHERE team_id = $1 AND user_id = $2
            ) AS member
            "#,
        )
            .bind(team_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("member")?)
    }

    async fn list_team_ids(&self) -> Result<Vec<Uuid>, Error> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT team_id FROM teams ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn teams_for_user(&self, user_id: Uuid) -> Result<Vec<Uuid>, Error> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT team_id
            FROM team_memberships
            WHERE user_id = $1
            ORDER BY joined_at ASC
            "#,
        )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
