// src/repositories/postgres/mod.rs

pub mod tokens;
pub mod token_sets;
pub mod ledger;
pub mod redemption_store;
pub mod team_directory;

pub use tokens::PostgresTokenRepository;
pub use token_sets::PostgresTokenSetRepository;
pub use ledger::PostgresLedgerRepository;
pub use redemption_store::PostgresRedemptionStore;
pub use team_directory::PostgresTeamDirectory;
