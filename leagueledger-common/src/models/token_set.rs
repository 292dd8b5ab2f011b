// File: leagueledger-common/src/models/token_set.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::Token;

/// A named batch of tokens issued together, e.g. "Trivia Night".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenSet {
    pub set_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A set together with its tokens in creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSetDetail {
    pub set: TokenSet,
    pub tokens: Vec<Token>,
}
