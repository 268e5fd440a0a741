use super::domain::{AssignedRank, ComputedScore, ProfileDetails, UserId, UserProfile};
use super::region::RegionScope;

/// Ranks for every employee of one region scope, applied as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankBatch {
    pub scope: RegionScope,
    pub assignments: Vec<(UserId, AssignedRank)>,
}

impl RankBatch {
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Storage abstraction for user profiles.
///
/// Score and rank only change through `record_score` and `apply_ranks`, which accept values
/// minted by the ranking engine. `apply_ranks` must be all-or-nothing: on error no
/// assignment of the batch may be visible to readers.
pub trait ProfileRepository: Send + Sync {
    fn insert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError>;
    fn update_details(
        &self,
        id: &UserId,
        details: ProfileDetails,
    ) -> Result<UserProfile, RepositoryError>;
    fn record_score(&self, id: &UserId, score: ComputedScore) -> Result<(), RepositoryError>;
    /// Every employee record, in any order.
    fn employees(&self) -> Result<Vec<UserProfile>, RepositoryError>;
    /// Employee records whose region matches the scope exactly.
    fn employees_in(&self, scope: &RegionScope) -> Result<Vec<UserProfile>, RepositoryError>;
    fn apply_ranks(&self, batch: &RankBatch) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Whether retrying the same write could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}
