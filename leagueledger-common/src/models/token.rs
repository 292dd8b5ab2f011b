// File: leagueledger-common/src/models/token.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Points are stored as NUMERIC(12,2); anything finer would be rounded by the store.
pub const MAX_POINTS_SCALE: u32 = 2;

/// Largest value NUMERIC(12,2) holds: 9,999,999,999.99.
pub const MAX_POINTS: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// A redeemable token, printed as a QR code or typed in by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Token {
    pub token_id: Uuid,
    pub code: String,
    pub points: Decimal,
    pub title: String,
    pub description: Option<String>,
    pub achievement_name: Option<String>,
    pub is_achievement_only: bool,
    /// `None` means single-use.
    pub max_uses: Option<i32>,
    pub use_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub set_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Derived lifecycle state. `Expired` overlays everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Unconsumed,
    PartiallyConsumed,
    Exhausted,
    Expired,
}

impl Token {
    pub fn effective_max_uses(&self) -> i32 {
        self.max_uses.unwrap_or(1)
    }

    pub fn is_exhausted(&self) -> bool {
        self.use_count >= self.effective_max_uses()
    }

    /// Tokens cannot be redeemed at or after `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if now >= exp)
    }

    pub fn remaining_uses(&self) -> i32 {
        (self.effective_max_uses() - self.use_count).max(0)
    }

    /// Points a redemption of this token is worth.
    pub fn awarded_points(&self) -> Decimal {
        if self.is_achievement_only {
            Decimal::ZERO
        } else {
            self.points
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_expired_at(now) {
            TokenState::Expired
        } else if self.is_exhausted() {
            TokenState::Exhausted
        } else if self.use_count == 0 {
            TokenState::Unconsumed
        } else {
            TokenState::PartiallyConsumed
        }
    }
}

/// What a code holder sees before applying it. Carries no ids and no code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPreview {
    pub title: String,
    pub description: Option<String>,
    pub points: Decimal,
    pub achievement_name: Option<String>,
    pub remaining_uses: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub state: TokenState,
}

impl Token {
    pub fn preview_at(&self, now: DateTime<Utc>) -> TokenPreview {
        TokenPreview {
            title: self.title.clone(),
            description: self.description.clone(),
            points: self.awarded_points(),
            achievement_name: self.achievement_name.clone(),
            remaining_uses: self.remaining_uses(),
            expires_at: self.expires_at,
            state: self.state_at(now),
        }
    }
}

/// Everything the issuer chooses about a token; code, ids and counters are
/// assigned at issuance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSpec {
    pub points: Decimal,
    pub title: String,
    pub description: Option<String>,
    pub achievement_name: Option<String>,
    pub is_achievement_only: bool,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub event_id: Option<Uuid>,
}

impl Default for TokenSpec {
    fn default() -> Self {
        Self {
            points: Decimal::ZERO,
            title: String::new(),
            description: None,
            achievement_name: None,
            is_achievement_only: false,
            max_uses: None,
            expires_at: None,
            event_id: None,
        }
    }
}

impl TokenSpec {
    pub fn points(points: Decimal) -> Self {
        Self { points, ..Default::default() }
    }

    pub fn achievement_only(name: &str) -> Self {
        Self {
            achievement_name: Some(name.to_string()),
            is_achievement_only: true,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let Some(max) = self.max_uses {
            if max < 1 {
                return Err(Error::Validation(format!("max_uses must be >= 1 (got {max})")));
            }
        }
        if self.points.is_sign_negative() && !self.points.is_zero() {
            return Err(Error::Validation("points must be non-negative".into()));
        }
        if self.points > MAX_POINTS {
            return Err(Error::Validation(format!("points may not exceed {MAX_POINTS}")));
        }
        if self.points.normalize().scale() > MAX_POINTS_SCALE {
            return Err(Error::Validation(format!(
                "points may carry at most {MAX_POINTS_SCALE} decimal places"
            )));
        }
        if self.is_achievement_only && self.achievement().is_none() {
            return Err(Error::Validation(
                "an achievement-only token must name its achievement".into(),
            ));
        }
        Ok(())
    }

    /// Achievement name with blank values treated as absent.
    pub fn achievement(&self) -> Option<&str> {
        self.achievement_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Builds the stored token. Callers validate first.
    pub fn into_token(self, code: String, set_id: Option<Uuid>, now: DateTime<Utc>) -> Token {
        let achievement_name = self.achievement().map(str::to_string);
        Token {
            token_id: Uuid::new_v4(),
            code,
            points: self.points.normalize(),
            title: self.title,
            description: self.description,
            achievement_name,
            is_achievement_only: self.is_achievement_only,
            max_uses: self.max_uses,
            use_count: 0,
            expires_at: self.expires_at,
            set_id,
            event_id: self.event_id,
            created_at: now,
        }
    }
}

/// Result of the conditional consume primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumeOutcome {
    /// Post-increment token.
    Consumed(Token),
    /// `use_count` moved since the caller read it.
    Conflict,
    Exhausted,
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token(max_uses: Option<i32>, use_count: i32) -> Token {
        let mut t = TokenSpec { max_uses, ..TokenSpec::points(Decimal::from(10)) }
            .into_token("code".into(), None, Utc::now());
        t.use_count = use_count;
        t
    }

    #[test]
    fn absent_max_uses_means_single_use() {
        let t = token(None, 0);
        assert_eq!(t.effective_max_uses(), 1);
        assert!(!t.is_exhausted());
        assert!(token(None, 1).is_exhausted());
    }

    #[test]
    fn state_follows_use_count_and_expiry() {
        let now = Utc::now();
        assert_eq!(token(Some(3), 0).state_at(now), TokenState::Unconsumed);
        assert_eq!(token(Some(3), 2).state_at(now), TokenState::PartiallyConsumed);
        assert_eq!(token(Some(3), 3).state_at(now), TokenState::Exhausted);

        let mut expired = token(Some(3), 1);
        expired.expires_at = Some(now);
        assert_eq!(expired.state_at(now), TokenState::Expired);
        assert_eq!(expired.state_at(now - Duration::seconds(1)), TokenState::PartiallyConsumed);
    }

    #[test]
    fn achievement_only_awards_zero_points() {
        let t = TokenSpec {
            points: Decimal::from(25),
            ..TokenSpec::achievement_only("Trivia Champion")
        }
        .into_token("c".into(), None, Utc::now());
        assert_eq!(t.awarded_points(), Decimal::ZERO);
        assert_eq!(t.achievement_name.as_deref(), Some("Trivia Champion"));
    }

    #[test]
    fn preview_reports_what_a_redemption_would_award() {
        let now = Utc::now();
        let mut t = TokenSpec {
            points: Decimal::new(750, 2),
            title: "Picture round".into(),
            max_uses: Some(3),
            ..Default::default()
        }
        .into_token("secret".into(), None, now);
        t.use_count = 1;

        let preview = t.preview_at(now);
        assert_eq!(preview.title, "Picture round");
        assert_eq!(preview.points, Decimal::new(75, 1));
        assert_eq!(preview.remaining_uses, 2);
        assert_eq!(preview.state, TokenState::PartiallyConsumed);

        let json = serde_json::to_value(&preview).unwrap();
        assert!(json.get("code").is_none());
        assert!(json.get("token_id").is_none());
    }

    #[test]
    fn validation_rejects_bad_specs() {
        let zero_uses = TokenSpec { max_uses: Some(0), ..Default::default() };
        assert!(matches!(zero_uses.validate(), Err(Error::Validation(_))));

        let negative = TokenSpec::points(Decimal::from(-1));
        assert!(matches!(negative.validate(), Err(Error::Validation(_))));

        let too_precise = TokenSpec::points(Decimal::new(1005, 3));
        assert!(matches!(too_precise.validate(), Err(Error::Validation(_))));

        let unnamed = TokenSpec {
            achievement_name: Some("   ".into()),
            is_achievement_only: true,
            ..Default::default()
        };
        assert!(matches!(unnamed.validate(), Err(Error::Validation(_))));

        let too_large = TokenSpec::points(Decimal::MAX);
        assert!(matches!(too_large.validate(), Err(Error::Validation(_))));
        let just_over = TokenSpec::points(MAX_POINTS + Decimal::new(1, 2));
        assert!(matches!(just_over.validate(), Err(Error::Validation(_))));

        assert_eq!(MAX_POINTS, Decimal::new(999_999_999_999, 2));
        assert!(TokenSpec::points(MAX_POINTS).validate().is_ok());
        assert!(TokenSpec::points(Decimal::new(250, 2)).validate().is_ok());
        assert!(TokenSpec::achievement_only("1st Place").validate().is_ok());
    }
}
