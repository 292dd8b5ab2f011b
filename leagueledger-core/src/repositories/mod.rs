// src/repositories/mod.rs

pub mod memory;
pub mod postgres;

pub use leagueledger_common::traits::directory_traits::TeamDirectory;
pub use leagueledger_common::traits::repository_traits::{
    LedgerRepository, RedemptionStore, TokenRepository, TokenSetRepository,
};

pub use memory::{MemoryLedgerStore, MemoryTeamDirectory};
pub use postgres::{
    PostgresLedgerRepository, PostgresRedemptionStore, PostgresTeamDirectory,
    PostgresTokenRepository, PostgresTokenSetRepository,
};
