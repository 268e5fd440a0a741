use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::RankingConfig;
use crate::workflows::ranking::domain::{
    ComputedScore, ProfileDetails, Region, ScoringInputs, UserId, UserProfile, UserRole,
};
use crate::workflows::ranking::region::RegionScope;
use crate::workflows::ranking::repository::{ProfileRepository, RankBatch, RepositoryError};
use crate::workflows::ranking::service::RankingService;

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn lagos() -> Region {
    Region::new("Nigeria", "Lagos", "Lagos")
}

pub(super) fn ikeja() -> Region {
    Region::new("Nigeria", "Lagos", "Ikeja")
}

pub(super) fn lagos_scope() -> RegionScope {
    RegionScope::city("Nigeria", "Lagos", "Lagos")
}

/// Inputs worth exactly `points` under the standard weights.
pub(super) fn inputs_worth(points: u32) -> ScoringInputs {
    ScoringInputs {
        years_experience: points / 2,
        skills: if points % 2 == 1 {
            vec!["excel".to_string()]
        } else {
            Vec::new()
        },
        ..ScoringInputs::default()
    }
}

pub(super) fn employee(id: &str, region: Region, points: u32, joined_minute: i64) -> UserProfile {
    UserProfile::signup(
        UserId(id.to_string()),
        UserRole::Employee,
        epoch() + Duration::minutes(joined_minute),
        ProfileDetails {
            display_name: format!("Employee {id}"),
            headline: None,
            region,
            inputs: inputs_worth(points),
        },
    )
}

/// Employee whose stored score already matches their inputs.
pub(super) fn scored_employee(
    id: &str,
    region: Region,
    points: u32,
    joined_minute: i64,
) -> UserProfile {
    let mut profile = employee(id, region, points, joined_minute);
    profile.standing.record_score(ComputedScore::new(points));
    profile
}

pub(super) fn employer(id: &str, region: Region) -> UserProfile {
    UserProfile::signup(
        UserId(id.to_string()),
        UserRole::Employer,
        epoch(),
        ProfileDetails {
            display_name: format!("Employer {id}"),
            headline: Some("Hiring".to_string()),
            region,
            inputs: inputs_worth(40),
        },
    )
}

pub(super) fn uid(id: &str) -> UserId {
    UserId(id.to_string())
}

pub(super) fn ranking_config() -> RankingConfig {
    RankingConfig {
        batch_retry_attempts: 2,
        leaderboard_limit: 10,
    }
}

pub(super) fn build_service(
    profiles: Vec<UserProfile>,
) -> (RankingService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::with_profiles(profiles));
    let service = RankingService::new(repository.clone(), ranking_config());
    (service, repository)
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<UserId, UserProfile>>,
    failing_scores: Mutex<HashSet<UserId>>,
    failing_cities: Mutex<HashSet<String>>,
    transient_rank_failures: AtomicUsize,
    rank_attempts: AtomicUsize,
}

impl MemoryRepository {
    pub(super) fn with_profiles(profiles: Vec<UserProfile>) -> Self {
        let repository = Self::default();
        {
            let mut records = repository.records.lock().expect("repository mutex poisoned");
            for profile in profiles {
                records.insert(profile.id.clone(), profile);
            }
        }
        repository
    }

    pub(super) fn get(&self, id: &str) -> UserProfile {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&uid(id))
            .cloned()
            .expect("profile present")
    }

    pub(super) fn rank_of(&self, id: &str) -> Option<u32> {
        self.get(id).standing.rank()
    }

    pub(super) fn score_of(&self, id: &str) -> u32 {
        self.get(id).standing.score()
    }

    /// (id, score, rank) for every record, sorted by id.
    pub(super) fn snapshot(&self) -> Vec<(UserId, u32, Option<u32>)> {
        let records = self.records.lock().expect("repository mutex poisoned");
        let mut rows: Vec<_> = records
            .values()
            .map(|p| (p.id.clone(), p.standing.score(), p.standing.rank()))
            .collect();
        rows.sort();
        rows
    }

    pub(super) fn fail_score_writes_for(&self, id: &str) {
        self.failing_scores
            .lock()
            .expect("failure mutex poisoned")
            .insert(uid(id));
    }

    pub(super) fn fail_rank_batches_for_city(&self, city: &str) {
        self.failing_cities
            .lock()
            .expect("failure mutex poisoned")
            .insert(city.to_string());
    }

    pub(super) fn fail_next_rank_batches(&self, count: usize) {
        self.transient_rank_failures.store(count, Ordering::SeqCst);
    }

    pub(super) fn rank_attempts(&self) -> usize {
        self.rank_attempts.load(Ordering::SeqCst)
    }
}

impl ProfileRepository for MemoryRepository {
    fn insert(&self, profile: UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut records = self.records.lock().expect("repository mutex poisoned");
        if records.contains_key(&profile.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let records = self.records.lock().expect("repository mutex poisoned");
        Ok(records.get(id).cloned())
    }

    fn update_details(
        &self,
        id: &UserId,
        details: ProfileDetails,
    ) -> Result<UserProfile, RepositoryError> {
        let mut records = self.records.lock().expect("repository mutex poisoned");
        let profile = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        profile.details = details;
        Ok(profile.clone())
    }

    fn record_score(&self, id: &UserId, score: ComputedScore) -> Result<(), RepositoryError> {
        if self
            .failing_scores
            .lock()
            .expect("failure mutex poisoned")
            .contains(id)
        {
            return Err(RepositoryError::Unavailable("score shard offline".to_string()));
        }
        let mut records = self.records.lock().expect("repository mutex poisoned");
        let profile = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        profile.standing.record_score(score);
        Ok(())
    }

    fn employees(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let records = self.records.lock().expect("repository mutex poisoned");
        Ok(records
            .values()
            .filter(|profile| profile.is_employee())
            .cloned()
            .collect())
    }

    fn employees_in(&self, scope: &RegionScope) -> Result<Vec<UserProfile>, RepositoryError> {
        let records = self.records.lock().expect("repository mutex poisoned");
        Ok(records
            .values()
            .filter(|profile| profile.is_employee() && scope.matches(&profile.details.region))
            .cloned()
            .collect())
    }

    fn apply_ranks(&self, batch: &RankBatch) -> Result<usize, RepositoryError> {
        self.rank_attempts.fetch_add(1, Ordering::SeqCst);

        let pending = self.transient_rank_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_rank_failures
                .store(pending - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("write timeout".to_string()));
        }
        if let Some(city) = &batch.scope.city {
            if self
                .failing_cities
                .lock()
                .expect("failure mutex poisoned")
                .contains(city)
            {
                return Err(RepositoryError::Unavailable("region shard offline".to_string()));
            }
        }

        let mut records = self.records.lock().expect("repository mutex poisoned");
        if batch
            .assignments
            .iter()
            .any(|(id, _)| !records.contains_key(id))
        {
            return Err(RepositoryError::NotFound);
        }
        for (id, rank) in &batch.assignments {
            if let Some(profile) = records.get_mut(id) {
                profile.standing.record_rank(*rank);
            }
        }
        Ok(batch.len())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
