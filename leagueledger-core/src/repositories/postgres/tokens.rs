// File: leagueledger-core/src/repositories/postgres/tokens.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use leagueledger_common::error::Error;
use leagueledger_common::models::{ConsumeOutcome, Token};
use leagueledger_common::traits::repository_traits::TokenRepository;

pub(crate) const TOKEN_COLUMNS: &str = r#"
    token_id,
    code,
    points,
    title,
    description,
    achievement_name,
    is_achievement_only,
    max_uses,
    use_count,
    expires_at,
    set_id,
    event_id,
    created_at
"#;

#[derive(Clone)]
pub struct PostgresTokenRepository {
    pool: Pool<Postgres>,
}

impl PostgresTokenRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_token_on(conn: &mut PgConnection, token: &Token) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO ledger_tokens (
            token_id,
            code,
            points,
            title,
            description,
            achievement_name,
            is_achievement_only,
            max_uses,
            use_count,
            expires_at,
            set_id,
            event_id,
            created_at
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        "#,
    )
        .bind(token.token_id)
        .bind(&token.code)
        .bind(token.points)
        .bind(&token.title)
        .bind(&token.description)
        .bind(&token.achievement_name)
        .bind(token.is_achievement_only)
        .bind(token.max_uses)
        .bind(token.use_count)
        .bind(token.expires_at)
        .bind(token.set_id)
        .bind(token.event_id)
        .bind(token.created_at)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// The conditional consume. The UPDATE's WHERE clause is the whole check, so
/// concurrent callers are serialised by the row lock and at most one of them
/// can move `use_count` from a given value. A zero-row result is classified
/// by reading the row back on the same connection.
pub(crate) async fn try_consume_on(
    conn: &mut PgConnection,
    token_id: Uuid,
    expected_use_count: i32,
    now: DateTime<Utc>,
) -> Result<ConsumeOutcome, Error> {
    let update_sql = format!(
        r#"
        UPDATE ledger_tokens
        SET use_count = use_count + 1
        WHERE token_id = $1
          AND use_count = $2
          AND use_count < COALESCE(max_uses, 1)
          AND (expires_at IS NULL OR expires_at > $3)
        RETURNING {TOKEN_COLUMNS}
        "#
    );
    let updated = sqlx::query_as::<_, Token>(&update_sql)
        .bind(token_id)
        .bind(expected_use_count)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(token) = updated {
        return Ok(ConsumeOutcome::Consumed(token));
    }

    let select_sql = format!("SELECT {TOKEN_COLUMNS} FROM ledger_tokens WHERE token_id = $1");
    let current = sqlx::query_as::<_, Token>(&select_sql)
        .bind(token_id)
        .fetch_optional(&mut *conn)
        .await?;

    match current {
        None => Err(Error::NotFound(format!("token {token_id}"))),
        Some(t) if t.is_exhausted() => Ok(ConsumeOutcome::Exhausted),
        Some(t) if t.is_expired_at(now) => Ok(ConsumeOutcome::Expired),
        Some(_) => Ok(ConsumeOutcome::Conflict),
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn create_token(&self, token: &Token) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        insert_token_on(&mut conn, token).await
    }

    async fn create_tokens(&self, tokens: &[Token]) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        for token in tokens {
            insert_token_on(&mut tx, token).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_token_by_id(&self, token_id: Uuid) -> Result<Option<Token>, Error> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM ledger_tokens WHERE token_id = $1");
        let token = sqlx::query_as::<_, Token>(&sql)
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(token)
    }

    async fn get_token_by_code(&self, code: &str) -> Result<Option<Token>, Error> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM ledger_tokens WHERE code = $1");
        let token = sqlx::query_as::<_, Token>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(token)
    }

    async fn list_tokens_for_set(&self, set_id: Uuid) -> Result<Vec<Token>, Error> {
        let sql = format!(
            r#"
            SELECT {TOKEN_COLUMNS}
            FROM ledger_tokens
            WHERE set_id = $1
            ORDER BY created_at ASC, token_id ASC
            "#
        );
        let tokens = sqlx::query_as::<_, Token>(&sql)
            .bind(set_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tokens)
    }

    async fn try_consume(
        &self,
        token_id: Uuid,
        expected_use_count: i32,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, Error> {
        let mut conn = self.pool.acquire().await?;
        try_consume_on(&mut conn, token_id, expected_use_count, now).await
    }

    async fn link_set_to_event(&self, set_id: Uuid, event_id: Uuid) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_tokens
            SET event_id = $2
            WHERE set_id = $1
              AND event_id IS NULL
            "#,
        )
            .bind(set_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
