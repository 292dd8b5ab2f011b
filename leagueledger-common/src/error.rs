// ================================================================
// File: leagueledger-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Uuid error: {0}")]
    Uuid(#[from] uuid::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Typed failures of a single `redeem(code, team)` call.
///
/// Only `Contention` and `StoreUnavailable` are worth retrying; everything else
/// is terminal for that code/team pair.
#[derive(Debug, Error)]
pub enum RedemptionError {
    #[error("invalid code")]
    InvalidCode,

    #[error("token already exhausted")]
    AlreadyExhausted,

    #[error("token expired")]
    Expired,

    #[error("team not found")]
    TeamNotFound,

    #[error("acting user is not a member of the target team")]
    NotTeamMember,

    #[error("no authenticated user")]
    Unauthenticated,

    #[error("redemption retry budget exhausted under contention")]
    Contention,

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] Error),
}

impl RedemptionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RedemptionError::Contention | RedemptionError::StoreUnavailable(_))
    }

    /// Fixed text safe to show an end user. Never includes ids or causes.
    pub fn user_message(&self) -> &'static str {
        match self {
            RedemptionError::InvalidCode => "invalid code",
            RedemptionError::AlreadyExhausted => "already redeemed",
            RedemptionError::Expired => "code expired",
            RedemptionError::TeamNotFound => "team not found",
            RedemptionError::NotTeamMember => "not a member of this team",
            RedemptionError::Unauthenticated => "sign in required",
            RedemptionError::Contention => "busy, please retry",
            RedemptionError::StoreUnavailable(_) => "service temporarily unavailable",
        }
    }
}

impl From<Error> for RedemptionError {
    fn from(e: Error) -> Self {
        match e {
            Error::Unauthenticated(_) => RedemptionError::Unauthenticated,
            other => RedemptionError::StoreUnavailable(other),
        }
    }
}

impl From<sqlx::Error> for RedemptionError {
    fn from(e: sqlx::Error) -> Self {
        RedemptionError::StoreUnavailable(Error::Database(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        assert!(RedemptionError::Contention.is_retryable());
        assert!(RedemptionError::StoreUnavailable(Error::Parse("x".into())).is_retryable());
        assert!(!RedemptionError::AlreadyExhausted.is_retryable());
        assert!(!RedemptionError::InvalidCode.is_retryable());
        assert!(!RedemptionError::Expired.is_retryable());
        assert!(!RedemptionError::TeamNotFound.is_retryable());
        assert!(!RedemptionError::Unauthenticated.is_retryable());
    }

    #[test]
    fn missing_identity_is_not_a_store_failure() {
        let err: RedemptionError = Error::Unauthenticated("no header".into()).into();
        assert!(matches!(err, RedemptionError::Unauthenticated));

        let err: RedemptionError = Error::Config("pool closed".into()).into();
        assert!(matches!(err, RedemptionError::StoreUnavailable(_)));
    }

    #[test]
    fn user_message_does_not_leak_cause() {
        let err = RedemptionError::StoreUnavailable(Error::NotFound("ledger_tokens row 42".into()));
        assert_eq!(err.user_message(), "service temporarily unavailable");
        assert!(!err.user_message().contains("42"));
    }
}
