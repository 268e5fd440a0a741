use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::assigner::RegionalRankAssigner;
use super::domain::{
    CandidateQuery, ExamCompletion, LeaderboardEntry, ProfileDetails, ProfileView, UserId,
    UserProfile, UserRole,
};
use super::region::{ranking_order, RegionQueryError, RegionScope};
use super::repository::{ProfileRepository, RepositoryError};
use super::score::ScoreCalculator;
use crate::config::RankingConfig;

/// Service composing the score calculator, regional assigner and profile store.
pub struct RankingService<R> {
    repository: Arc<R>,
    calculator: ScoreCalculator,
    assigner: RegionalRankAssigner<R>,
    config: RankingConfig,
}

/// Aggregate result of a full recalculation sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub employees_scored: usize,
    pub score_failures: usize,
    /// Employees scored but not ranked because their city, state or country is unknown.
    pub unranked_employees: usize,
    pub regions_ranked: usize,
    pub region_failures: usize,
    pub ranks_assigned: usize,
}

impl SweepSummary {
    pub fn had_failures(&self) -> bool {
        self.score_failures > 0 || self.region_failures > 0
    }
}

/// Result of a trigger that writes profile fields before re-ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdateOutcome {
    pub profile: ProfileView,
    /// Set when the profile write succeeded but the ranking cascade did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_warning: Option<String>,
}

impl<R> RankingService<R>
where
    R: ProfileRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: RankingConfig) -> Self {
        let assigner = RegionalRankAssigner::new(repository.clone(), config.batch_retry_attempts);
        Self {
            repository,
            calculator: ScoreCalculator::default(),
            assigner,
            config,
        }
    }

    /// Recompute one employee's score, then re-rank their city when it is fully known.
    pub fn update_user_ranking(&self, user_id: &UserId) -> Result<ProfileView, RankingError> {
        let profile = self.load_employee(user_id)?;

        let score = self.calculator.score(&profile.details.inputs);
        self.repository.record_score(user_id, score)?;

        match RegionScope::for_region(&profile.details.region) {
            Some(scope) => {
                self.assigner.rerank(&scope)?;
            }
            None => {
                info!(%user_id, "region incomplete, rank left unchanged");
            }
        }

        let refreshed = self.load(user_id)?;
        info!(
            %user_id,
            score = refreshed.standing.score(),
            rank = ?refreshed.standing.rank(),
            "ranking refreshed"
        );
        Ok(refreshed.view())
    }

    /// Rescore every employee and re-rank every fully known city.
    ///
    /// Individual score or region failures are logged and counted; only failing to list the
    /// employees at all aborts the sweep.
    pub fn recalculate_all_rankings(&self) -> Result<SweepSummary, RankingError> {
        let employees = self.repository.employees()?;
        let mut summary = SweepSummary::default();
        let mut regions: BTreeSet<RegionScope> = BTreeSet::new();

        for profile in employees.iter().filter(|profile| profile.is_employee()) {
            let score = self.calculator.score(&profile.details.inputs);
            match self.repository.record_score(&profile.id, score) {
                Ok(()) => summary.employees_scored += 1,
                Err(err) => {
                    warn!(user_id = %profile.id, error = %err, "score update failed during sweep");
                    summary.score_failures += 1;
                }
            }

            match RegionScope::for_region(&profile.details.region) {
                Some(scope) => {
                    regions.insert(scope);
                }
                None => summary.unranked_employees += 1,
            }
        }

        for scope in &regions {
            match self.assigner.rerank(scope) {
                Ok(updated) => {
                    summary.regions_ranked += 1;
                    summary.ranks_assigned += updated;
                }
                Err(err) => {
                    warn!(region = %scope, error = %err, "region re-rank failed during sweep");
                    summary.region_failures += 1;
                }
            }
        }

        info!(
            scored = summary.employees_scored,
            score_failures = summary.score_failures,
            unranked = summary.unranked_employees,
            regions = summary.regions_ranked,
            region_failures = summary.region_failures,
            "ranking sweep finished"
        );
        Ok(summary)
    }

    /// Re-rank a single region scope on demand.
    pub fn rerank_region(&self, scope: &RegionScope) -> Result<usize, RankingError> {
        self.assigner.rerank(scope)
    }

    /// Persist edited profile fields, then refresh the ranking for employees.
    ///
    /// An employee who moves city also triggers a re-rank of the city they left.
    pub fn apply_profile_update(
        &self,
        user_id: &UserId,
        details: ProfileDetails,
    ) -> Result<ProfileUpdateOutcome, RankingError> {
        let stored = self.load(user_id)?;
        let updated = self.repository.update_details(user_id, details)?;

        if !stored.is_employee() {
            return Ok(ProfileUpdateOutcome {
                profile: updated.view(),
                ranking_warning: None,
            });
        }

        let new_scope = RegionScope::for_region(&updated.details.region);
        let vacated = RegionScope::for_region(&stored.details.region)
            .filter(|previous| new_scope.as_ref() != Some(previous));

        let mut outcome = self.cascade_after_write(updated);
        if let Some(scope) = vacated {
            if let Err(err) = self.assigner.rerank(&scope) {
                warn!(%user_id, region = %scope, error = %err, "previous city re-rank failed");
                outcome.ranking_warning.get_or_insert_with(|| err.to_string());
            }
        }
        Ok(outcome)
    }

    /// Count a finished exam (and any earned certification), then refresh the ranking.
    pub fn record_exam_completion(
        &self,
        user_id: &UserId,
        completion: ExamCompletion,
    ) -> Result<ProfileUpdateOutcome, RankingError> {
        let profile = self.load_employee(user_id)?;

        let mut details = profile.details;
        details.inputs.exams_taken = details.inputs.exams_taken.saturating_add(1);
        if completion.passed {
            if let Some(certification) = completion
                .certification
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
            {
                details.inputs.certifications.push(certification);
            }
        }

        let updated = self.repository.update_details(user_id, details)?;
        Ok(self.cascade_after_write(updated))
    }

    /// Employees of a scope in ranking order, with positions local to this listing.
    pub fn leaderboard(
        &self,
        scope: &RegionScope,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardEntry>, RankingError> {
        scope.validate()?;
        let limit = limit.unwrap_or(self.config.leaderboard_limit);

        let mut employees = self.repository.employees_in(scope)?;
        employees.retain(UserProfile::is_employee);
        employees.sort_by(ranking_order);

        Ok(employees
            .into_iter()
            .take(limit)
            .zip(1u32..)
            .map(|(profile, position)| LeaderboardEntry {
                position,
                user_id: profile.id,
                display_name: profile.details.display_name,
                region: profile.details.region,
                score: profile.standing.score(),
                city_rank: profile.standing.rank(),
            })
            .collect())
    }

    /// Employer-facing search ordered by score.
    pub fn candidates(&self, query: &CandidateQuery) -> Result<Vec<ProfileView>, RankingError> {
        let scope = RegionScope {
            country: query.country.clone(),
            state: query.state.clone(),
            city: query.city.clone(),
        };
        let mut employees = if scope == RegionScope::default() {
            self.repository.employees()?
        } else {
            scope.validate()?;
            self.repository.employees_in(&scope)?
        };

        let skill = query
            .skill
            .as_deref()
            .map(str::trim)
            .filter(|skill| !skill.is_empty());
        employees.retain(|profile| {
            profile.is_employee()
                && query
                    .min_score
                    .map_or(true, |min| profile.standing.score() >= min)
                && skill.map_or(true, |wanted| {
                    profile
                        .details
                        .inputs
                        .skills
                        .iter()
                        .any(|skill| skill.trim().eq_ignore_ascii_case(wanted))
                })
        });
        employees.sort_by(ranking_order);

        let limit = query.limit.unwrap_or(self.config.leaderboard_limit);
        Ok(employees
            .iter()
            .take(limit)
            .map(UserProfile::view)
            .collect())
    }

    /// Dashboard view; employees also get their score breakdown.
    pub fn profile(&self, user_id: &UserId) -> Result<ProfileView, RankingError> {
        let profile = self.load(user_id)?;
        let mut view = profile.view();
        if profile.is_employee() {
            view.breakdown = Some(self.calculator.breakdown(&profile.details.inputs));
        }
        Ok(view)
    }

    fn cascade_after_write(&self, written: UserProfile) -> ProfileUpdateOutcome {
        match self.update_user_ranking(&written.id) {
            Ok(profile) => ProfileUpdateOutcome {
                profile,
                ranking_warning: None,
            },
            Err(err) => {
                warn!(user_id = %written.id, error = %err, "profile saved but ranking failed");
                ProfileUpdateOutcome {
                    profile: written.view(),
                    ranking_warning: Some(err.to_string()),
                }
            }
        }
    }

    fn load(&self, user_id: &UserId) -> Result<UserProfile, RankingError> {
        self.repository
            .fetch(user_id)?
            .ok_or_else(|| RankingError::NotFound {
                user_id: user_id.clone(),
            })
    }

    fn load_employee(&self, user_id: &UserId) -> Result<UserProfile, RankingError> {
        let profile = self.load(user_id)?;
        if !profile.is_employee() {
            return Err(RankingError::InvalidRole {
                user_id: user_id.clone(),
                role: profile.role,
            });
        }
        Ok(profile)
    }
}

/// Error raised by the ranking engine.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("user {user_id} not found")]
    NotFound { user_id: UserId },
    #[error("user {user_id} is an {} and cannot be ranked", role.label())]
    InvalidRole { user_id: UserId, role: UserRole },
    #[error("invalid region scope: {0}")]
    RegionQuery(#[from] RegionQueryError),
    #[error("ranking data could not be persisted: {0}")]
    Persistence(#[from] RepositoryError),
}
