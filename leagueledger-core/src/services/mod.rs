// File: src/services/mod.rs

pub mod token_service;
pub mod redemption_service;
pub mod ledger_service;
pub mod ranking_service;
pub mod token_set_service;

pub use token_service::{generate_code, TokenService, MAX_BATCH_QUANTITY};
pub use redemption_service::{RedemptionPolicy, RedemptionService};
pub use ledger_service::LedgerService;
pub use ranking_service::RankingService;
pub use token_set_service::TokenSetService;
