use serde::{Deserialize, Serialize};

use super::domain::{ComputedScore, ScoringInputs};

/// Points awarded per scoring factor. Stored scores depend on these exact values.
pub const STANDARD_WEIGHTS: ScoreWeights = ScoreWeights {
    per_experience_year: 2,
    per_skill: 1,
    per_exam: 10,
    per_certification: 15,
    resume_bonus: 10,
    complete_profile_bonus: 5,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub per_experience_year: u32,
    pub per_skill: u32,
    pub per_exam: u32,
    pub per_certification: u32,
    pub resume_bonus: u32,
    pub complete_profile_bonus: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Experience,
    Skills,
    Exams,
    Certifications,
    Resume,
    ProfileCompletion,
}

/// Discrete contribution to a score so dashboards can show where points came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub factor: ScoreFactor,
    pub points: u32,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub components: Vec<ScoreComponent>,
}

/// Stateless calculator mapping a profile snapshot to its score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreCalculator {
    weights: ScoreWeights,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self {
            weights: STANDARD_WEIGHTS,
        }
    }
}

impl ScoreCalculator {
    pub fn score(&self, inputs: &ScoringInputs) -> ComputedScore {
        ComputedScore::new(self.breakdown(inputs).total)
    }

    pub fn breakdown(&self, inputs: &ScoringInputs) -> ScoreBreakdown {
        let weights = &self.weights;
        let has_resume = inputs.has_resume();

        let components = vec![
            ScoreComponent {
                factor: ScoreFactor::Experience,
                points: weights
                    .per_experience_year
                    .saturating_mul(inputs.years_experience),
                notes: format!("{} years of experience", inputs.years_experience),
            },
            ScoreComponent {
                factor: ScoreFactor::Skills,
                points: weights.per_skill.saturating_mul(count(inputs.skills.len())),
                notes: format!("{} skills listed", inputs.skills.len()),
            },
            ScoreComponent {
                factor: ScoreFactor::Exams,
                points: weights.per_exam.saturating_mul(inputs.exams_taken),
                notes: format!("{} exams taken", inputs.exams_taken),
            },
            ScoreComponent {
                factor: ScoreFactor::Certifications,
                points: weights
                    .per_certification
                    .saturating_mul(count(inputs.certifications.len())),
                notes: format!("{} certifications earned", inputs.certifications.len()),
            },
            ScoreComponent {
                factor: ScoreFactor::Resume,
                points: if has_resume { weights.resume_bonus } else { 0 },
                notes: if has_resume {
                    "resume on file".to_string()
                } else {
                    "no resume on file".to_string()
                },
            },
            ScoreComponent {
                factor: ScoreFactor::ProfileCompletion,
                points: if inputs.profile_complete {
                    weights.complete_profile_bonus
                } else {
                    0
                },
                notes: if inputs.profile_complete {
                    "profile complete".to_string()
                } else {
                    "profile incomplete".to_string()
                },
            },
        ];

        let total = components
            .iter()
            .fold(0u32, |acc, component| acc.saturating_add(component.points));

        ScoreBreakdown { total, components }
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worked_example() -> ScoringInputs {
        ScoringInputs {
            years_experience: 3,
            skills: vec!["A".to_string(), "B".to_string()],
            exams_taken: 2,
            certifications: vec!["X".to_string()],
            resume: Some("resumes/u-1.pdf".to_string()),
            profile_complete: true,
        }
    }

    #[test]
    fn worked_example_scores_fifty_eight() {
        let calculator = ScoreCalculator::default();
        assert_eq!(calculator.score(&worked_example()).value(), 58);
    }

    #[test]
    fn repeated_calls_agree() {
        let calculator = ScoreCalculator::default();
        let inputs = worked_example();
        assert_eq!(calculator.score(&inputs), calculator.score(&inputs));
        assert_eq!(calculator.breakdown(&inputs), calculator.breakdown(&inputs));
    }

    #[test]
    fn empty_snapshot_scores_zero() {
        let calculator = ScoreCalculator::default();
        assert_eq!(calculator.score(&ScoringInputs::default()).value(), 0);
    }

    #[test]
    fn absent_json_fields_default_to_zero() {
        let inputs: ScoringInputs =
            serde_json::from_str(r#"{"skills": ["rust"]}"#).expect("partial snapshot parses");
        assert_eq!(ScoreCalculator::default().score(&inputs).value(), 1);
    }

    #[test]
    fn each_input_is_monotonic() {
        let calculator = ScoreCalculator::default();
        let base = worked_example();
        let baseline = calculator.score(&base).value();

        let mut bumps = Vec::new();

        let mut more_experience = base.clone();
        more_experience.years_experience += 1;
        bumps.push(more_experience);

        let mut more_skills = base.clone();
        more_skills.skills.push("C".to_string());
        bumps.push(more_skills);

        let mut more_exams = base.clone();
        more_exams.exams_taken += 1;
        bumps.push(more_exams);

        let mut more_certifications = base.clone();
        more_certifications.certifications.push("Y".to_string());
        bumps.push(more_certifications);

        for bumped in bumps {
            assert!(calculator.score(&bumped).value() > baseline);
        }

        let without_resume = ScoringInputs {
            resume: None,
            ..base.clone()
        };
        let incomplete = ScoringInputs {
            profile_complete: false,
            ..base
        };
        assert!(calculator.score(&without_resume).value() < baseline);
        assert!(calculator.score(&incomplete).value() < baseline);
    }

    #[test]
    fn breakdown_components_sum_to_total() {
        let breakdown = ScoreCalculator::default().breakdown(&worked_example());
        let sum: u32 = breakdown.components.iter().map(|c| c.points).sum();
        assert_eq!(sum, breakdown.total);
        assert_eq!(breakdown.components.len(), 6);
    }

    #[test]
    fn huge_inputs_saturate() {
        let inputs = ScoringInputs {
            years_experience: u32::MAX,
            exams_taken: u32::MAX,
            ..ScoringInputs::default()
        };
        assert_eq!(ScoreCalculator::default().score(&inputs).value(), u32::MAX);
    }
}
