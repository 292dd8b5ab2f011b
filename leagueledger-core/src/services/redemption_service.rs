// File: leagueledger-core/src/services/redemption_service.rs
//
// The redeem(code, team) contract. All coordination between concurrent
// redeemers goes through the store's conditional consume; this service
// only re-reads and retries when that consume reports a conflict.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::RedemptionError;
use crate::models::{ConsumeOutcome, RedemptionFact, RedemptionResult, Token};
use crate::repositories::{RedemptionStore, TeamDirectory, TokenRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionPolicy {
    /// Conditional-consume attempts per call before giving up with `Contention`.
    pub max_attempts: u32,
    /// Require the acting user to belong to the target team.
    pub require_membership: bool,
}

impl Default for RedemptionPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, require_membership: true }
    }
}

pub struct RedemptionService {
    tokens: Arc<dyn TokenRepository>,
    store: Arc<dyn RedemptionStore>,
    directory: Arc<dyn TeamDirectory>,
    policy: RedemptionPolicy,
}

impl RedemptionService {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        store: Arc<dyn RedemptionStore>,
        directory: Arc<dyn TeamDirectory>,
        policy: RedemptionPolicy,
    ) -> Self {
        Self { tokens, store, directory, policy }
    }

    pub fn policy(&self) -> RedemptionPolicy {
        self.policy
    }

    pub async fn redeem(
        &self,
        user_id: Uuid,
        code: &str,
        team_id: Uuid,
    ) -> Result<RedemptionResult, RedemptionError> {
        self.redeem_at(user_id, code, team_id, Utc::now()).await
    }

    /// `redeem` with an explicit clock. `now` is both the expiry reference
    /// and the fact's `redeemed_at`.
    pub async fn redeem_at(
        &self,
        user_id: Uuid,
        code: &str,
        team_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RedemptionResult, RedemptionError> {
        let mut token = self
            .tokens
            .get_token_by_code(code)
            .await?
            .ok_or(RedemptionError::InvalidCode)?;

        Self::check_redeemable(&token, now)?;

        if !self.directory.team_exists(team_id).await? {
            return Err(RedemptionError::TeamNotFound);
        }
        if self.policy.require_membership && !self.directory.is_member(user_id, team_id).await? {
            warn!("User {} tried to redeem token {} for team {} without membership", user_id, token.token_id, team_id);
            return Err(RedemptionError::NotTeamMember);
        }

        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            let fact = RedemptionFact::for_token(&token, team_id, user_id, now);

            match self.store.consume_and_record(token.use_count, now, &fact).await? {
                ConsumeOutcome::Consumed(consumed) => {
                    info!(
                        "Token {} redeemed for team {} (use {}/{}, {} points)",
                        consumed.token_id,
                        team_id,
                        consumed.use_count,
                        consumed.effective_max_uses(),
                        fact.points_awarded
                    );
                    return Ok(RedemptionResult::from_fact(&fact, &consumed));
                }
                ConsumeOutcome::Exhausted => return Err(RedemptionError::AlreadyExhausted),
                ConsumeOutcome::Expired => return Err(RedemptionError::Expired),
                ConsumeOutcome::Conflict => {
                    debug!("Conflict on token {} (attempt {}), re-reading", token.token_id, attempt);
                    token = self
                        .tokens
                        .get_token_by_id(token.token_id)
                        .await?
                        .ok_or(RedemptionError::InvalidCode)?;
                    Self::check_redeemable(&token, now)?;
                }
            }
        }

        warn!(
            "Giving up on token {} for team {} after {} attempts",
            token.token_id, team_id, attempts
        );
        Err(RedemptionError::Contention)
    }

    fn check_redeemable(token: &Token, now: DateTime<Utc>) -> Result<(), RedemptionError> {
        if token.is_exhausted() {
            return Err(RedemptionError::AlreadyExhausted);
        }
        if token.is_expired_at(now) {
            return Err(RedemptionError::Expired);
        }
        Ok(())
    }
}
