//! leagueledger-server/src/context.rs
//!
//! Shared state handed to every HTTP handler.

use std::sync::Arc;

use leagueledger_core::services::RedemptionPolicy;
use leagueledger_core::traits::api::LeagueApi;
use leagueledger_core::{Database, LeagueLedger};

use crate::Args;

#[derive(Clone)]
pub struct ServerContext {
    pub api: Arc<dyn LeagueApi>,
}

impl ServerContext {
    pub fn new(api: Arc<dyn LeagueApi>) -> Self {
        Self { api }
    }

    pub fn postgres(db: &Database, args: &Args) -> Self {
        let policy = RedemptionPolicy {
            max_attempts: args.redeem_max_attempts,
            require_membership: args.require_membership,
        };
        Self::new(Arc::new(LeagueLedger::postgres(db, policy)))
    }
}
