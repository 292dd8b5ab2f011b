// src/lib.rs

pub mod db;
pub mod repositories;
pub mod services;
pub mod api;
pub mod test_utils;

pub use db::Database;
pub use api::LeagueLedger;
pub use leagueledger_common::error::{Error, RedemptionError};
pub use leagueledger_common::{models, traits};
