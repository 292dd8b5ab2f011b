// File: leagueledger-core/src/repositories/postgres/token_sets.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use leagueledger_common::error::Error;
use leagueledger_common::models::TokenSet;
use leagueledger_common::traits::repository_traits::TokenSetRepository;

#[derive(Clone)]
pub struct PostgresTokenSetRepository {
    pool: Pool<Postgres>,
}

impl PostgresTokenSetRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenSetRepository for PostgresTokenSetRepository {
    async fn create_set(&self, set: &TokenSet) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO token_sets (set_id, name, description, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
            .bind(set.set_id)
            .bind(&set.name)
            .bind(&set.description)
            .bind(set.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_set(&self, set_id: Uuid) -> Result<Option<TokenSet>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT set_id, name, description, created_at
            FROM token_sets
            WHERE set_id = $1
            "#,
        )
            .bind(set_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row_opt {
            Ok(Some(TokenSet {
                set_id: r.try_get("set_id")?,
                name: r.try_get("name")?,
                description: r.try_get("description")?,
                created_at: r.try_get("created_at")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn list_sets(&self) -> Result<Vec<TokenSet>, Error> {
        let sets = sqlx::query_as::<_, TokenSet>(
            r#"
            SELECT set_id, name, description, created_at
            FROM token_sets
            ORDER BY created_at DESC
            "#,
        )
            .fetch_all(&self.pool)
            .await?;
        Ok(sets)
    }
}
