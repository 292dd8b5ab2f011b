//! api/mod.rs
//!
//! `LeagueLedger` wires the services over one set of stores and implements
//! the `LeagueApi` traits for the presentation layer.

pub mod redemption_api_impl;
pub mod standings_api_impl;
pub mod token_set_api_impl;

use std::sync::Arc;

use crate::db::Database;
use crate::repositories::{
    LedgerRepository, MemoryLedgerStore, MemoryTeamDirectory, PostgresLedgerRepository,
    PostgresRedemptionStore, PostgresTeamDirectory, PostgresTokenRepository,
    PostgresTokenSetRepository, RedemptionStore, TeamDirectory, TokenRepository,
    TokenSetRepository,
};
use crate::services::{
    LedgerService, RankingService, RedemptionPolicy, RedemptionService, TokenService,
    TokenSetService,
};

#[derive(Clone)]
pub struct LeagueLedger {
    pub token_service: Arc<TokenService>,
    pub redemption_service: Arc<RedemptionService>,
    pub ledger_service: Arc<LedgerService>,
    pub ranking_service: Arc<RankingService>,
    pub token_set_service: Arc<TokenSetService>,
}

impl LeagueLedger {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        sets: Arc<dyn TokenSetRepository>,
        ledger: Arc<dyn LedgerRepository>,
        store: Arc<dyn RedemptionStore>,
        directory: Arc<dyn TeamDirectory>,
        policy: RedemptionPolicy,
    ) -> Self {
        let token_service = Arc::new(TokenService::new(tokens.clone()));
        let redemption_service = Arc::new(RedemptionService::new(
            tokens.clone(),
            store,
            directory.clone(),
            policy,
        ));
        let ledger_service = Arc::new(LedgerService::new(ledger.clone()));
        let ranking_service = Arc::new(RankingService::new(ledger, directory));
        let token_set_service = Arc::new(TokenSetService::new(sets, tokens, token_service.clone()));

        Self {
            token_service,
            redemption_service,
            ledger_service,
            ranking_service,
            token_set_service,
        }
    }

    pub fn postgres(db: &Database, policy: RedemptionPolicy) -> Self {
        let pool = db.pool().clone();
        Self::new(
            Arc::new(PostgresTokenRepository::new(pool.clone())),
            Arc::new(PostgresTokenSetRepository::new(pool.clone())),
            Arc::new(PostgresLedgerRepository::new(pool.clone())),
            Arc::new(PostgresRedemptionStore::new(pool.clone())),
            Arc::new(PostgresTeamDirectory::new(pool)),
            policy,
        )
    }

    pub fn in_memory(
        store: Arc<MemoryLedgerStore>,
        directory: Arc<MemoryTeamDirectory>,
        policy: RedemptionPolicy,
    ) -> Self {
        Self::new(store.clone(), store.clone(), store.clone(), store, directory, policy)
    }
}
