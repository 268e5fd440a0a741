use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::score::ScoreBreakdown;

/// Identifier wrapper for platform users.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Employee,
    Employer,
    Admin,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Employee => "employee",
            UserRole::Employer => "employer",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "employee" => Some(Self::Employee),
            "employer" => Some(Self::Employer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Location fields as captured on the profile. Any component may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

impl Region {
    pub fn new(country: &str, state: &str, city: &str) -> Self {
        Self {
            country: Some(country.to_string()),
            state: Some(state.to_string()),
            city: Some(city.to_string()),
        }
    }

    /// Returns the (country, state, city) triple when every component is present and non-blank.
    pub fn complete_triple(&self) -> Option<(&str, &str, &str)> {
        let country = non_blank(self.country.as_deref())?;
        let state = non_blank(self.state.as_deref())?;
        let city = non_blank(self.city.as_deref())?;
        Some((country, state, city))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// Inputs read by the score calculator. Missing fields fall back to their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringInputs {
    pub years_experience: u32,
    pub skills: Vec<String>,
    pub exams_taken: u32,
    pub certifications: Vec<String>,
    pub resume: Option<String>,
    pub profile_complete: bool,
}

impl ScoringInputs {
    pub fn has_resume(&self) -> bool {
        self.resume
            .as_deref()
            .is_some_and(|reference| !reference.trim().is_empty())
    }
}

/// Editable, non-derived profile fields. Profile-update triggers replace these wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDetails {
    pub display_name: String,
    pub headline: Option<String>,
    pub region: Region,
    pub inputs: ScoringInputs,
}

/// A score produced by the calculator. Only the ranking engine can mint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComputedScore(u32);

impl ComputedScore {
    pub(crate) const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

/// A rank produced by the regional assigner. Only the ranking engine can mint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AssignedRank(u32);

impl AssignedRank {
    pub(crate) const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Derived score and rank of a profile.
///
/// Fields are private and there is no `Deserialize`, so stores can persist engine output
/// but never invent it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Standing {
    score: u32,
    rank: Option<u32>,
}

impl Standing {
    /// Standing of a freshly created profile: score 0, unranked.
    pub const fn unranked() -> Self {
        Self {
            score: 0,
            rank: None,
        }
    }

    pub const fn score(&self) -> u32 {
        self.score
    }

    pub const fn rank(&self) -> Option<u32> {
        self.rank
    }

    pub fn record_score(&mut self, score: ComputedScore) {
        self.score = score.value();
    }

    pub fn record_rank(&mut self, rank: AssignedRank) {
        self.rank = Some(rank.value());
    }
}

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub details: ProfileDetails,
    pub credential: Option<String>,
    /// Always unranked when read from external data; only the engine fills it in.
    #[serde(skip_deserializing)]
    pub standing: Standing,
}

impl UserProfile {
    /// New signup: derived fields start at score 0 and unranked.
    pub fn signup(
        id: UserId,
        role: UserRole,
        created_at: DateTime<Utc>,
        details: ProfileDetails,
    ) -> Self {
        Self {
            id,
            role,
            created_at,
            details,
            credential: None,
            standing: Standing::unranked(),
        }
    }

    pub fn is_employee(&self) -> bool {
        self.role == UserRole::Employee
    }

    pub fn view(&self) -> ProfileView {
        ProfileView {
            user_id: self.id.clone(),
            role: self.role,
            display_name: self.details.display_name.clone(),
            headline: self.details.headline.clone(),
            region: self.details.region.clone(),
            inputs: self.details.inputs.clone(),
            score: self.standing.score(),
            rank: self.standing.rank(),
            breakdown: None,
        }
    }
}

/// Public representation of a profile. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub user_id: UserId,
    pub role: UserRole,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    pub region: Region,
    pub inputs: ScoringInputs,
    pub score: u32,
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

/// Exam result reported by the exam-submission handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamCompletion {
    pub passed: bool,
    pub certification: Option<String>,
}

/// One row of a leaderboard listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// Position inside this listing, 1-based.
    pub position: u32,
    pub user_id: UserId,
    pub display_name: String,
    pub region: Region,
    pub score: u32,
    /// Persisted rank within the employee's own city scope.
    pub city_rank: Option<u32>,
}

/// Employer-side candidate search filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CandidateQuery {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub min_score: Option<u32>,
    pub skill: Option<String>,
    pub limit: Option<usize>,
}
