// File: leagueledger-common/src/models/mod.rs
pub mod token;
pub mod token_set;
pub mod redemption;
pub mod ranking;

pub use token::{ConsumeOutcome, Token, TokenPreview, TokenSpec, TokenState, MAX_POINTS};
pub use token_set::{TokenSet, TokenSetDetail};
pub use redemption::{AchievementGrant, RedemptionFact, RedemptionResult};
pub use ranking::{
    add_points, assign_competition_ranks, start_of_month, with_universe, MemberOverview, RankWindow,
    TeamPoints, TeamStanding, TeamSummary,
};
