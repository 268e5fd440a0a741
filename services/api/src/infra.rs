use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};
use talent_rank::workflows::ranking::{
    ComputedScore, ProfileDetails, ProfileRepository, RankBatch, RegionScope, RepositoryError,
    UserId, UserProfile,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local profile store backing the HTTP service and the CLI.
///
/// Rank batches are applied under the write lock after every id is verified, so readers see
/// either the previous ranks of a region or the new ones.
#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileRepository {
    records: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryProfileRepository {
    pub(crate) fn seed(&self, profiles: Vec<UserProfile>) -> Result<usize, RepositoryError> {
        let mut seeded = 0;
        for profile in profiles {
            self.insert(profile)?;
            seeded += 1;
        }
        Ok(seeded)
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Unavailable("profile store lock poisoned".to_string())
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    fn insert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut guard = self.records.write().map_err(|_| Self::poisoned())?;
        if guard.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let guard = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(guard.get(id).cloned())
    }

    fn update_details(
        &self,
        id: &UserId,
        details: ProfileDetails,
    ) -> Result<UserProfile, RepositoryError> {
        let mut guard = self.records.write().map_err(|_| Self::poisoned())?;
        let profile = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        profile.details = details;
        Ok(profile.clone())
    }

    fn record_score(&self, id: &UserId, score: ComputedScore) -> Result<(), RepositoryError> {
        let mut guard = self.records.write().map_err(|_| Self::poisoned())?;
        let profile = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        profile.standing.record_score(score);
        Ok(())
    }

    fn employees(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let guard = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(guard
            .values()
            .filter(|profile| profile.is_employee())
            .cloned()
            .collect())
    }

    fn employees_in(&self, scope: &RegionScope) -> Result<Vec<UserProfile>, RepositoryError> {
        let guard = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(guard
            .values()
            .filter(|profile| profile.is_employee() && scope.matches(&profile.details.region))
            .cloned()
            .collect())
    }

    fn apply_ranks(&self, batch: &RankBatch) -> Result<usize, RepositoryError> {
        let mut guard = self.records.write().map_err(|_| Self::poisoned())?;
        if batch.assignments.iter().any(|(id, _)| !guard.contains_key(id)) {
            return Err(RepositoryError::NotFound);
        }
        for (id, rank) in &batch.assignments {
            if let Some(profile) = guard.get_mut(id) {
                profile.standing.record_rank(*rank);
            }
        }
        Ok(batch.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use talent_rank::config::RankingConfig;
    use talent_rank::workflows::ranking::{RankingService, Region, UserRole};

    fn profile(id: &str) -> UserProfile {
        UserProfile::signup(
            UserId(id.to_string()),
            UserRole::Employee,
            Utc::now(),
            ProfileDetails {
                region: Region::new("Nigeria", "Lagos", "Lagos"),
                ..ProfileDetails::default()
            },
        )
    }

    #[test]
    fn seed_rejects_duplicate_ids() {
        let store = InMemoryProfileRepository::default();
        let result = store.seed(vec![profile("u-1"), profile("u-1")]);
        assert_eq!(result, Err(RepositoryError::Conflict));
    }

    #[test]
    fn sweep_over_store_assigns_city_ranks() {
        let store = Arc::new(InMemoryProfileRepository::default());
        let mut strong = profile("u-strong");
        strong.details.inputs.years_experience = 10;
        store
            .seed(vec![profile("u-weak"), strong])
            .expect("seeded");
        let service = RankingService::new(store.clone(), RankingConfig::default());

        let summary = service.recalculate_all_rankings().expect("sweep runs");
        assert_eq!(summary.ranks_assigned, 2);

        let rank_of = |id: &str| {
            store
                .fetch(&UserId(id.to_string()))
                .expect("fetch succeeds")
                .expect("present")
                .standing
                .rank()
        };
        assert_eq!(rank_of("u-strong"), Some(1));
        assert_eq!(rank_of("u-weak"), Some(2));
    }
}
