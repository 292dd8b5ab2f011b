// File: leagueledger-core/src/test_utils/helpers.rs

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::Error;
use crate::api::LeagueLedger;
use crate::db::Database;
use crate::repositories::{MemoryLedgerStore, MemoryTeamDirectory};
use crate::services::RedemptionPolicy;

static DB_LOCK: Mutex<()> = Mutex::const_new(());

/// `TEST_DATABASE_URL`, if set. Postgres tests skip when this is `None`.
pub fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok().filter(|u| !u.trim().is_empty())
}

pub async fn create_test_db_pool(url: &str) -> Result<Pool<Postgres>, Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await?;
    Ok(pool)
}

/// Wipes ledger and directory tables so each test starts empty.
pub async fn clean_database(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            redemption_facts,
            ledger_tokens,
            token_sets,
            team_memberships,
            teams
        CASCADE
        "#,
    )
        .execute(pool)
        .await?;
    Ok(())
}

/// Tests in one binary share the database; hold this guard for the whole test.
pub async fn lock_test_database() -> MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

/// A migrated, empty test database, or `None` when no URL is configured.
pub async fn setup_test_database() -> Result<Option<Database>, Error> {
    let Some(url) = test_database_url() else {
        return Ok(None);
    };
    let db = Database::from_pool(create_test_db_pool(&url).await?);
    db.migrate().await?;
    clean_database(db.pool()).await?;
    Ok(Some(db))
}

pub async fn insert_team(pool: &Pool<Postgres>, name: &str) -> Result<Uuid, Error> {
    let team_id = Uuid::new_v4();
    sqlx::query("INSERT INTO teams (team_id, name) VALUES ($1, $2)")
        .bind(team_id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(team_id)
}

pub async fn add_member(pool: &Pool<Postgres>, team_id: Uuid, user_id: Uuid) -> Result<(), Error> {
    sqlx::query("INSERT INTO team_memberships (team_id, user_id) VALUES ($1, $2)")
        .bind(team_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// In-memory ledger plus handles on its store and directory for seeding.
pub fn memory_ledger(
    policy: RedemptionPolicy,
) -> (LeagueLedger, Arc<MemoryLedgerStore>, Arc<MemoryTeamDirectory>) {
    let store = Arc::new(MemoryLedgerStore::new());
    let directory = Arc::new(MemoryTeamDirectory::new());
    let ledger = LeagueLedger::in_memory(store.clone(), directory.clone(), policy);
    (ledger, store, directory)
}
