//! Regional scoring and ranking of employee profiles.
//!
//! Scores come from a fixed-weight calculator; ranks are dense within a
//! (country, state, city) scope and are written back to the store one region at a time.

pub mod assigner;
pub mod domain;
pub mod import;
pub mod region;
pub mod repository;
pub mod router;
pub mod score;
pub mod service;

#[cfg(test)]
mod tests;

pub use assigner::RegionalRankAssigner;
pub use domain::{
    AssignedRank, CandidateQuery, ComputedScore, ExamCompletion, LeaderboardEntry,
    ProfileDetails, ProfileView, Region, ScoringInputs, Standing, UserId, UserProfile, UserRole,
};
pub use import::{ProfileCsvImporter, ProfileImportError};
pub use region::{ranking_order, RegionQueryError, RegionScope};
pub use repository::{ProfileRepository, RankBatch, RepositoryError};
pub use router::ranking_router;
pub use score::{ScoreBreakdown, ScoreCalculator, ScoreComponent, ScoreFactor, STANDARD_WEIGHTS};
pub use service::{ProfileUpdateOutcome, RankingError, RankingService, SweepSummary};
