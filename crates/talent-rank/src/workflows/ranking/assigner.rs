use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::domain::{AssignedRank, UserId, UserProfile};
use super::region::{ranking_order, RegionScope};
use super::repository::{ProfileRepository, RankBatch, RepositoryError};
use super::service::RankingError;

/// Dense ranking among the employees of one region scope.
///
/// Read, sort and write for a scope run under a per-scope lock so two re-ranks of the same
/// region never interleave. Different regions proceed independently.
pub struct RegionalRankAssigner<R> {
    repository: Arc<R>,
    retry_attempts: u8,
    locks: Mutex<HashMap<RegionScope, Arc<Mutex<()>>>>,
}

impl<R> RegionalRankAssigner<R>
where
    R: ProfileRepository + 'static,
{
    pub fn new(repository: Arc<R>, retry_attempts: u8) -> Self {
        Self {
            repository,
            retry_attempts,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Re-rank every employee in the city `scope`, returning how many records were updated.
    ///
    /// Country or state scopes are rejected: the stored rank is always a city rank.
    pub fn rerank(&self, scope: &RegionScope) -> Result<usize, RankingError> {
        scope.validate_rank_scope()?;

        let region_lock = self.region_lock(scope);
        let outcome = {
            let _guard = region_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.rerank_locked(scope)
        };
        drop(region_lock);
        self.release_idle_locks();
        outcome
    }

    fn rerank_locked(&self, scope: &RegionScope) -> Result<usize, RankingError> {
        let mut employees = self.repository.employees_in(scope)?;
        employees.retain(UserProfile::is_employee);
        if employees.is_empty() {
            debug!(region = %scope, "no employees to rank");
            return Ok(0);
        }

        let batch = RankBatch {
            scope: scope.clone(),
            assignments: dense_ranks(employees),
        };
        let updated = self.apply_with_retry(&batch)?;

        info!(region = %scope, updated, "region re-ranked");
        Ok(updated)
    }

    fn apply_with_retry(&self, batch: &RankBatch) -> Result<usize, RepositoryError> {
        let mut attempt: u8 = 0;
        loop {
            match self.repository.apply_ranks(batch) {
                Ok(updated) => return Ok(updated),
                Err(err) if err.is_transient() && attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(
                        region = %batch.scope,
                        attempt,
                        error = %err,
                        "rank batch failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn region_lock(&self, scope: &RegionScope) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(scope.clone()).or_default().clone()
    }

    /// Drop lock entries no caller holds, so the map tracks only regions being re-ranked.
    fn release_idle_locks(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    pub(crate) fn tracked_regions(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Sort into ranking order and number the result 1..=N.
pub(crate) fn dense_ranks(mut employees: Vec<UserProfile>) -> Vec<(UserId, AssignedRank)> {
    employees.sort_by(ranking_order);
    employees
        .into_iter()
        .zip(1u32..)
        .map(|(profile, rank)| (profile.id, AssignedRank::new(rank)))
        .collect()
}
