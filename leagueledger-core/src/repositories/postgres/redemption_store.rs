// File: leagueledger-core/src/repositories/postgres/redemption_store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use tracing::{debug, warn};

use leagueledger_common::error::Error;
use leagueledger_common::models::{ConsumeOutcome, RedemptionFact};
use leagueledger_common::traits::repository_traits::RedemptionStore;

use super::ledger::insert_fact_on;
use super::tokens::try_consume_on;

/// Runs the conditional consume and the fact insert in one transaction.
/// Anything short of `commit` (an error, or the future being dropped)
/// rolls both back.
#[derive(Clone)]
pub struct PostgresRedemptionStore {
    pool: Pool<Postgres>,
}

impl PostgresRedemptionStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn consume_on(
        conn: &mut PgConnection,
        expected_use_count: i32,
        now: DateTime<Utc>,
        fact: &RedemptionFact,
    ) -> Result<ConsumeOutcome, Error> {
        let outcome = try_consume_on(&mut *conn, fact.token_id, expected_use_count, now).await?;
        if let ConsumeOutcome::Consumed(token) = &outcome {
            if token.use_count != fact.use_ordinal {
                return Err(Error::Validation(format!(
                    "fact ordinal {} does not follow use_count {}",
                    fact.use_ordinal, expected_use_count
                )));
            }
            insert_fact_on(&mut *conn, fact).await?;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl RedemptionStore for PostgresRedemptionStore {
    async fn consume_and_record(
        &self,
        expected_use_count: i32,
        now: DateTime<Utc>,
        fact: &RedemptionFact,
    ) -> Result<ConsumeOutcome, Error> {
        let mut tx = self.pool.begin().await?;

        match Self::consume_on(&mut tx, expected_use_count, now, fact).await {
            Ok(ConsumeOutcome::Consumed(token)) => {
                tx.commit().await?;
                debug!(
                    "Recorded fact {} for token {} (use {})",
                    fact.fact_id, fact.token_id, fact.use_ordinal
                );
                Ok(ConsumeOutcome::Consumed(token))
            }
            Ok(refused) => {
                tx.rollback().await?;
                Ok(refused)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!("Rollback after failed redemption of token {} failed: {}", fact.token_id, rb);
                }
                Err(e)
            }
        }
    }
}
