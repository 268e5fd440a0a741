use crate::infra::InMemoryProfileRepository;
use chrono::{Duration, TimeZone, Utc};
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use talent_rank::config::AppConfig;
use talent_rank::error::AppError;
use talent_rank::workflows::ranking::{
    ExamCompletion, ProfileCsvImporter, ProfileDetails, ProfileRepository, RankingError,
    RankingService, Region, RegionScope, ScoringInputs, SweepSummary, UserId, UserProfile,
    UserRole,
};

#[derive(Args, Debug)]
pub(crate) struct RecalculateArgs {
    /// CSV export of user profiles to rank
    #[arg(long)]
    pub(crate) profiles_csv: PathBuf,
    /// Number of entries to print per city leaderboard (defaults to the configured limit)
    #[arg(long)]
    pub(crate) top: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Number of entries to print per leaderboard.
    #[arg(long)]
    pub(crate) top: Option<usize>,
    /// Skip the exam completion portion of the demo.
    #[arg(long)]
    pub(crate) skip_exam: bool,
}

pub(crate) fn run_recalculate(args: RecalculateArgs) -> Result<(), AppError> {
    let RecalculateArgs { profiles_csv, top } = args;
    let config = AppConfig::load()?;

    let profiles = ProfileCsvImporter::from_path(&profiles_csv)?;
    let repository = Arc::new(InMemoryProfileRepository::default());
    let seeded = repository.seed(profiles).map_err(RankingError::from)?;
    let service = RankingService::new(repository.clone(), config.ranking);

    println!("Ranking recalculation");
    println!(
        "Data source: {} ({} profiles)",
        profiles_csv.display(),
        seeded
    );

    let summary = service.recalculate_all_rankings()?;
    render_summary(&summary);

    let scopes = city_scopes(repository.as_ref())?;
    if scopes.is_empty() {
        println!("\nNo employee has a complete region; nothing was ranked");
        return Ok(());
    }
    for scope in &scopes {
        render_leaderboard(&service, scope, top)?;
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { top, skip_exam } = args;

    println!("Regional ranking demo");
    let repository = Arc::new(InMemoryProfileRepository::default());
    let seeded = repository
        .seed(demo_population())
        .map_err(RankingError::from)?;
    let service = RankingService::new(repository.clone(), Default::default());
    println!("Seeded {} demo profiles (scores start at 0, unranked)", seeded);

    let summary = service.recalculate_all_rankings()?;
    render_summary(&summary);

    let lagos = RegionScope::city("Nigeria", "Lagos", "Lagos");
    render_leaderboard(&service, &lagos, top)?;
    render_leaderboard(&service, &RegionScope::country("Nigeria"), top)?;

    let tunde = UserId("demo-tunde".to_string());
    match service.profile(&tunde) {
        Ok(view) => {
            println!("\nScore breakdown for {}", view.display_name);
            if let Some(breakdown) = &view.breakdown {
                for component in &breakdown.components {
                    println!(
                        "  - {:?}: {} ({})",
                        component.factor, component.points, component.notes
                    );
                }
                println!("  = {} points", breakdown.total);
            }
        }
        Err(err) => println!("\nScore breakdown unavailable: {}", err),
    }

    if skip_exam {
        return Ok(());
    }

    println!("\nExam completion: {} passes and earns AWS", tunde.0);
    let outcome = match service.record_exam_completion(
        &tunde,
        ExamCompletion {
            passed: true,
            certification: Some("AWS".to_string()),
        },
    ) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Exam rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "  New score {} | city rank {}",
        outcome.profile.score,
        rank_label(outcome.profile.rank)
    );
    if let Some(warning) = &outcome.ranking_warning {
        println!("  Ranking warning: {}", warning);
    }
    render_leaderboard(&service, &lagos, top)?;

    match serde_json::to_string_pretty(&outcome.profile) {
        Ok(json) => println!("\nPublic profile payload:\n{}", json),
        Err(err) => println!("\nPublic profile payload unavailable: {}", err),
    }

    Ok(())
}

fn render_summary(summary: &SweepSummary) {
    println!("\nSweep summary");
    println!(
        "- {} employees scored ({} failed)",
        summary.employees_scored, summary.score_failures
    );
    println!(
        "- {} regions ranked ({} failed) | {} ranks assigned",
        summary.regions_ranked, summary.region_failures, summary.ranks_assigned
    );
    println!(
        "- {} employees left unranked (incomplete region)",
        summary.unranked_employees
    );
    if summary.had_failures() {
        println!("- Some writes failed; rerun the sweep once storage recovers");
    }
}

fn render_leaderboard<R>(
    service: &RankingService<R>,
    scope: &RegionScope,
    top: Option<usize>,
) -> Result<(), AppError>
where
    R: ProfileRepository + 'static,
{
    let entries = service.leaderboard(scope, top)?;
    println!("\nLeaderboard: {}", scope);
    if entries.is_empty() {
        println!("- no ranked employees");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{:>3}. {} ({}) | score {} | city rank {}",
            entry.position,
            entry.display_name,
            entry.user_id,
            entry.score,
            rank_label(entry.city_rank)
        );
    }
    Ok(())
}

fn rank_label(rank: Option<u32>) -> String {
    match rank {
        Some(rank) => format!("#{rank}"),
        None => "unranked".to_string(),
    }
}

fn city_scopes<R: ProfileRepository>(repository: &R) -> Result<BTreeSet<RegionScope>, AppError> {
    let employees = repository.employees().map_err(RankingError::from)?;
    Ok(employees
        .iter()
        .filter_map(|profile| RegionScope::for_region(&profile.details.region))
        .collect())
}

fn demo_population() -> Vec<UserProfile> {
    let joined = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single().unwrap_or_default();
    let employee = |id: &str, name: &str, days: i64, region: Region, inputs: ScoringInputs| {
        UserProfile::signup(
            UserId(id.to_string()),
            UserRole::Employee,
            joined + Duration::days(days),
            ProfileDetails {
                display_name: name.to_string(),
                headline: None,
                region,
                inputs,
            },
        )
    };
    let lagos = || Region::new("Nigeria", "Lagos", "Lagos");

    vec![
        employee(
            "demo-amaka",
            "Amaka",
            0,
            lagos(),
            ScoringInputs {
                years_experience: 10,
                skills: vec!["rust".into(), "kubernetes".into(), "sql".into()],
                exams_taken: 2,
                certifications: vec!["CKA".into()],
                resume: Some("cv/amaka.pdf".into()),
                profile_complete: true,
            },
        ),
        employee(
            "demo-tunde",
            "Tunde",
            30,
            lagos(),
            ScoringInputs {
                years_experience: 10,
                skills: vec!["go".into(), "postgres".into(), "terraform".into()],
                exams_taken: 2,
                certifications: vec!["AWS-SAA".into()],
                resume: Some("cv/tunde.pdf".into()),
                profile_complete: true,
            },
        ),
        employee(
            "demo-ngozi",
            "Ngozi",
            10,
            lagos(),
            ScoringInputs {
                years_experience: 5,
                skills: vec!["excel".into(), "python".into()],
                exams_taken: 1,
                certifications: Vec::new(),
                resume: Some("cv/ngozi.pdf".into()),
                profile_complete: true,
            },
        ),
        employee(
            "demo-bola",
            "Bola",
            5,
            Region::new("Nigeria", "FCT", "Abuja"),
            ScoringInputs {
                years_experience: 4,
                skills: vec!["java".into()],
                exams_taken: 1,
                certifications: vec!["OCP".into()],
                resume: None,
                profile_complete: false,
            },
        ),
        employee(
            "demo-sade",
            "Sade",
            12,
            Region {
                country: Some("Nigeria".into()),
                state: None,
                city: None,
            },
            ScoringInputs {
                years_experience: 2,
                ..ScoringInputs::default()
            },
        ),
        UserProfile::signup(
            UserId("demo-acme".to_string()),
            UserRole::Employer,
            joined,
            ProfileDetails {
                display_name: "Acme Hiring".to_string(),
                headline: Some("Hiring backend engineers".to_string()),
                region: lagos(),
                inputs: ScoringInputs::default(),
            },
        ),
    ]
}
