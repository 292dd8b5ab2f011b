// File: leagueledger-core/src/repositories/memory/store.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use uuid::Uuid;

use leagueledger_common::error::Error;
use leagueledger_common::models::{
    add_points, AchievementGrant, ConsumeOutcome, RedemptionFact, TeamPoints, Token, TokenSet,
};
use leagueledger_common::traits::repository_traits::{
    LedgerRepository, RedemptionStore, TokenRepository, TokenSetRepository,
};

#[derive(Default)]
struct FactLog {
    entries: Vec<RedemptionFact>,
    ids: HashSet<Uuid>,
    ordinals: HashSet<(Uuid, i32)>,
}

/// Tokens, sets and the fact log in one process.
///
/// Lock order is always token entry, then fact log. Readers of the fact log
/// never touch token entries.
#[derive(Default)]
pub struct MemoryLedgerStore {
    tokens: DashMap<Uuid, Token>,
    codes: DashMap<String, Uuid>,
    sets: DashMap<Uuid, TokenSet>,
    facts: RwLock<FactLog>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fact_count(&self) -> usize {
        self.facts.read().entries.len()
    }

    /// Why `token` cannot be consumed from `expected`, if it cannot.
    fn refusal(token: &Token, expected_use_count: i32, now: DateTime<Utc>) -> Option<ConsumeOutcome> {
        if token.is_exhausted() {
            Some(ConsumeOutcome::Exhausted)
        } else if token.is_expired_at(now) {
            Some(ConsumeOutcome::Expired)
        } else if token.use_count != expected_use_count {
            Some(ConsumeOutcome::Conflict)
        } else {
            None
        }
    }

    fn check_insertable(&self, token: &Token) -> Result<(), Error> {
        if self.tokens.contains_key(&token.token_id) {
            return Err(Error::Validation(format!("duplicate token id {}", token.token_id)));
        }
        if self.codes.contains_key(&token.code) {
            return Err(Error::Validation("duplicate token code".into()));
        }
        if let Some(set_id) = token.set_id {
            if !self.sets.contains_key(&set_id) {
                return Err(Error::NotFound(format!("token set {set_id}")));
            }
        }
        Ok(())
    }

    fn insert_unchecked(&self, token: &Token) {
        self.codes.insert(token.code.clone(), token.token_id);
        self.tokens.insert(token.token_id, token.clone());
    }

    fn windowed_totals(&self, since: Option<DateTime<Utc>>) -> Result<HashMap<Uuid, Decimal>, Error> {
        let log = self.facts.read();
        let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
        for f in log.entries.iter().filter(|f| since.is_none_or(|s| f.redeemed_at >= s)) {
            let total = totals.entry(f.team_id).or_insert(Decimal::ZERO);
            *total = add_points(*total, f.points_awarded)?;
        }
        Ok(totals)
    }
}

#[async_trait]
impl TokenRepository for MemoryLedgerStore {
    async fn create_token(&self, token: &Token) -> Result<(), Error> {
        self.check_insertable(token)?;
        self.insert_unchecked(token);
        Ok(())
    }

    async fn create_tokens(&self, tokens: &[Token]) -> Result<(), Error> {
        let mut batch_codes = HashSet::new();
        for token in tokens {
            self.check_insertable(token)?;
            if !batch_codes.insert(token.code.as_str()) {
                return Err(Error::Validation("duplicate token code".into()));
            }
        }
        for token in tokens {
            self.insert_unchecked(token);
        }
        Ok(())
    }

    async fn get_token_by_id(&self, token_id: Uuid) -> Result<Option<Token>, Error> {
        Ok(self.tokens.get(&token_id).map(|t| t.value().clone()))
    }

    async fn get_token_by_code(&self, code: &str) -> Result<Option<Token>, Error> {
        let Some(token_id) = self.codes.get(code).map(|id| *id.value()) else {
            return Ok(None);
        };
        Ok(self.tokens.get(&token_id).map(|t| t.value().clone()))
    }

    async fn list_tokens_for_set(&self, set_id: Uuid) -> Result<Vec<Token>, Error> {
        let mut tokens: Vec<Token> = self
            .tokens
            .iter()
            .filter(|t| t.set_id == Some(set_id))
            .map(|t| t.value().clone())
            .collect();
        tokens.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.token_id.cmp(&b.token_id)));
        Ok(tokens)
    }

    async fn try_consume(
        &self,
        token_id: Uuid,
        expected_use_count: i32,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, Error> {
        let mut entry = self
            .tokens
            .get_mut(&token_id)
            .ok_or_else(|| Error::NotFound(format!("token {token_id}")))?;

        if let Some(refused) = Self::refusal(&entry, expected_use_count, now) {
            return Ok(refused);
        }
        entry.use_count += 1;
        Ok(ConsumeOutcome::Consumed(entry.clone()))
    }

    async fn link_set_to_event(&self, set_id: Uuid, event_id: Uuid) -> Result<u64, Error> {
        let mut updated = 0;
        for mut token in self.tokens.iter_mut() {
            if token.set_id == Some(set_id) && token.event_id.is_none() {
                token.event_id = Some(event_id);
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl TokenSetRepository for MemoryLedgerStore {
    async fn create_set(&self, set: &TokenSet) -> Result<(), Error> {
        if self.sets.contains_key(&set.set_id) {
            return Err(Error::Validation(format!("duplicate set id {}", set.set_id)));
        }
        self.sets.insert(set.set_id, set.clone());
        Ok(())
    }

    async fn get_set(&self, set_id: Uuid) -> Result<Option<TokenSet>, Error> {
        Ok(self.sets.get(&set_id).map(|s| s.value().clone()))
    }

    async fn list_sets(&self) -> Result<Vec<TokenSet>, Error> {
        let mut sets: Vec<TokenSet> = self.sets.iter().map(|s| s.value().clone()).collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sets)
    }
}

#[async_trait]
impl RedemptionStore for MemoryLedgerStore {
    async fn consume_and_record(
        &self,
        expected_use_count: i32,
        now: DateTime<Utc>,
        fact: &RedemptionFact,
    ) -> Result<ConsumeOutcome, Error> {
        let mut entry = self
            .tokens
            .get_mut(&fact.token_id)
            .ok_or_else(|| Error::NotFound(format!("token {}", fact.token_id)))?;

        if let Some(refused) = Self::refusal(&entry, expected_use_count, now) {
            return Ok(refused);
        }
        if fact.use_ordinal != expected_use_count + 1 {
            return Err(Error::Validation(format!(
                "fact ordinal {} does not follow use_count {}",
                fact.use_ordinal, expected_use_count
            )));
        }

        // Reject the append before touching the token so a failed write
        // leaves use_count as it was.
        let mut log = self.facts.write();
        if log.ids.contains(&fact.fact_id) {
            return Err(Error::Validation(format!("duplicate fact id {}", fact.fact_id)));
        }
        if !log.ordinals.insert((fact.token_id, fact.use_ordinal)) {
            return Err(Error::Validation(format!(
                "token {} already has a fact for use {}",
                fact.token_id, fact.use_ordinal
            )));
        }
        log.ids.insert(fact.fact_id);
        log.entries.push(fact.clone());

        entry.use_count += 1;
        Ok(ConsumeOutcome::Consumed(entry.clone()))
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerStore {
    async fn points_for_team(
        &self,
        team_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Decimal, Error> {
        let log = self.facts.read();
        log.entries
            .iter()
            .filter(|f| f.team_id == team_id && since.is_none_or(|s| f.redeemed_at >= s))
            .try_fold(Decimal::ZERO, |acc, f| add_points(acc, f.points_awarded))
    }

    async fn achievements_for_team(&self, team_id: Uuid) -> Result<Vec<AchievementGrant>, Error> {
        let log = self.facts.read();
        let mut facts: Vec<&RedemptionFact> = log
            .entries
            .iter()
            .filter(|f| f.team_id == team_id && f.achievement_granted.is_some())
            .collect();
        facts.sort_by(|a, b| a.redeemed_at.cmp(&b.redeemed_at).then_with(|| a.use_ordinal.cmp(&b.use_ordinal)));

        Ok(facts
            .into_iter()
            .filter_map(|f| {
                f.achievement_granted.as_ref().map(|name| AchievementGrant {
                    achievement_name: name.clone(),
                    event_id: f.event_id,
                    redeemed_at: f.redeemed_at,
                })
            })
            .collect())
    }

    async fn team_totals(&self, since: Option<DateTime<Utc>>) -> Result<Vec<TeamPoints>, Error> {
        Ok(self
            .windowed_totals(since)?
            .into_iter()
            .map(|(team_id, points)| TeamPoints { team_id, points })
            .collect())
    }

    async fn count_teams_above(
        &self,
        points: Decimal,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, Error> {
        Ok(self.windowed_totals(since)?.values().filter(|p| **p > points).count() as i64)
    }

    async fn facts_for_token(&self, token_id: Uuid) -> Result<Vec<RedemptionFact>, Error> {
        let log = self.facts.read();
        let mut facts: Vec<RedemptionFact> =
            log.entries.iter().filter(|f| f.token_id == token_id).cloned().collect();
        facts.sort_by_key(|f| f.use_ordinal);
        Ok(facts)
    }

    async fn recent_facts_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RedemptionFact>, Error> {
        let log = self.facts.read();
        let mut facts: Vec<RedemptionFact> = log
            .entries
            .iter()
            .filter(|f| f.redeemed_by_user_id == user_id)
            .cloned()
            .collect();
        facts.sort_by(|a, b| b.redeemed_at.cmp(&a.redeemed_at));
        facts.truncate(limit.max(0) as usize);
        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leagueledger_common::models::TokenSpec;

    fn stored_token(store: &MemoryLedgerStore, max_uses: Option<i32>) -> Token {
        let token = TokenSpec { max_uses, ..TokenSpec::points(Decimal::from(5)) }
            .into_token(Uuid::new_v4().to_string(), None, Utc::now());
        store.insert_unchecked(&token);
        token
    }

    #[tokio::test]
    async fn try_consume_checks_expected_count() -> Result<(), Error> {
        let store = MemoryLedgerStore::new();
        let token = stored_token(&store, Some(2));
        let now = Utc::now();

        assert_eq!(store.try_consume(token.token_id, 1, now).await?, ConsumeOutcome::Conflict);
        assert!(matches!(store.try_consume(token.token_id, 0, now).await?, ConsumeOutcome::Consumed(t) if t.use_count == 1));
        assert!(matches!(store.try_consume(token.token_id, 1, now).await?, ConsumeOutcome::Consumed(t) if t.use_count == 2));
        assert_eq!(store.try_consume(token.token_id, 2, now).await?, ConsumeOutcome::Exhausted);
        Ok(())
    }

    #[tokio::test]
    async fn try_consume_unknown_token_is_not_found() {
        let store = MemoryLedgerStore::new();
        let res = store.try_consume(Uuid::new_v4(), 0, Utc::now()).await;
        assert!(matches!(res, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_append_leaves_token_untouched() -> Result<(), Error> {
        let store = MemoryLedgerStore::new();
        let first = stored_token(&store, None);
        let second = stored_token(&store, None);
        let now = Utc::now();

        let fact = RedemptionFact::for_token(&first, Uuid::new_v4(), Uuid::new_v4(), now);
        store.consume_and_record(0, now, &fact).await?;

        // Same fact id against another token must fail without consuming it.
        let mut clash = RedemptionFact::for_token(&second, Uuid::new_v4(), Uuid::new_v4(), now);
        clash.fact_id = fact.fact_id;
        assert!(store.consume_and_record(0, now, &clash).await.is_err());

        let after = store.get_token_by_id(second.token_id).await?.expect("token exists");
        assert_eq!(after.use_count, 0);
        assert_eq!(store.fact_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn overflowing_totals_are_refused() -> Result<(), Error> {
        let store = MemoryLedgerStore::new();
        let team = Uuid::new_v4();
        let now = Utc::now();
        for _ in 0..2 {
            let token = TokenSpec::points(Decimal::MAX).into_token(Uuid::new_v4().to_string(), None, now);
            store.insert_unchecked(&token);
            let fact = RedemptionFact::for_token(&token, team, Uuid::new_v4(), now);
            store.consume_and_record(0, now, &fact).await?;
        }

        assert!(matches!(store.team_totals(None).await, Err(Error::Validation(_))));
        assert!(matches!(store.points_for_team(team, None).await, Err(Error::Validation(_))));
        assert!(matches!(store.count_teams_above(Decimal::ZERO, None).await, Err(Error::Validation(_))));
        Ok(())
    }
}
