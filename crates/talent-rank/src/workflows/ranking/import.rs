use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{ProfileDetails, Region, ScoringInputs, UserId, UserProfile, UserRole};

#[derive(Debug)]
pub enum ProfileImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: u64, reason: String },
}

impl std::fmt::Display for ProfileImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileImportError::Io(err) => write!(f, "failed to read profile export: {}", err),
            ProfileImportError::Csv(err) => write!(f, "invalid profile CSV data: {}", err),
            ProfileImportError::InvalidRow { line, reason } => {
                write!(f, "profile row on line {} rejected: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for ProfileImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileImportError::Io(err) => Some(err),
            ProfileImportError::Csv(err) => Some(err),
            ProfileImportError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for ProfileImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ProfileImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads user profiles from a CSV export so operators can seed a store and run a sweep.
///
/// Expected headers: `id, role, name, country, state, city, years_experience, skills,
/// exams_taken, certifications, resume, profile_complete, created_at`. List columns are
/// `;`-separated. Imported profiles start with score 0 and no rank.
pub struct ProfileCsvImporter;

impl ProfileCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<UserProfile>, ProfileImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<UserProfile>, ProfileImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut profiles = Vec::new();

        for result in csv_reader.deserialize::<ProfileRow>() {
            let row = result?;
            // header occupies line 1
            let line = u64::try_from(profiles.len()).unwrap_or(u64::MAX) + 2;
            profiles.push(row.into_profile(line)?);
        }

        Ok(profiles)
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: String,
    role: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    country: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    state: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    years_experience: Option<String>,
    #[serde(default)]
    skills: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    exams_taken: Option<String>,
    #[serde(default)]
    certifications: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    resume: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    profile_complete: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl ProfileRow {
    fn into_profile(self, line: u64) -> Result<UserProfile, ProfileImportError> {
        let reject = |reason: String| ProfileImportError::InvalidRow { line, reason };

        if self.id.is_empty() {
            return Err(reject("missing id".to_string()));
        }
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| reject(format!("unknown role '{}'", self.role)))?;
        let years_experience = parse_count(self.years_experience.as_deref())
            .ok_or_else(|| reject("years_experience must be a non-negative integer".to_string()))?;
        let exams_taken = parse_count(self.exams_taken.as_deref())
            .ok_or_else(|| reject("exams_taken must be a non-negative integer".to_string()))?;
        let profile_complete = parse_flag(self.profile_complete.as_deref())
            .ok_or_else(|| reject("profile_complete must be true or false".to_string()))?;
        let created_at = match self.created_at.as_deref() {
            Some(raw) => parse_timestamp(raw)
                .ok_or_else(|| reject(format!("unreadable created_at '{raw}'")))?,
            None => DateTime::<Utc>::default(),
        };

        let details = ProfileDetails {
            display_name: self.name,
            headline: None,
            region: Region {
                country: self.country,
                state: self.state,
                city: self.city,
            },
            inputs: ScoringInputs {
                years_experience,
                skills: split_list(&self.skills),
                exams_taken,
                certifications: split_list(&self.certifications),
                resume: self.resume,
                profile_complete,
            },
        };

        Ok(UserProfile::signup(
            UserId(self.id),
            role,
            created_at,
            details,
        ))
    }
}

fn parse_count(raw: Option<&str>) -> Option<u32> {
    match raw {
        Some(value) => value.parse::<u32>().ok(),
        None => Some(0),
    }
}

fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None => Some(false),
        Some("true" | "yes" | "y" | "1") => Some(true),
        Some("false" | "no" | "n" | "0") => Some(false),
        Some(_) => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|raw| !raw.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,role,name,country,state,city,years_experience,skills,exams_taken,certifications,resume,profile_complete,created_at\n";

    #[test]
    fn imports_rows_with_lists_and_defaults() {
        let csv = format!(
            "{HEADER}u-1,employee,Ada,Nigeria,Lagos,Lagos,3,rust; sql,2,AWS,cv/ada.pdf,true,2024-01-05T09:00:00Z\n\
u-2,employer,Acme,,,,,,,,,,\n"
        );

        let profiles = ProfileCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
        assert_eq!(profiles.len(), 2);

        let ada = &profiles[0];
        assert_eq!(ada.role, UserRole::Employee);
        assert_eq!(ada.details.inputs.skills, vec!["rust", "sql"]);
        assert_eq!(ada.details.inputs.certifications, vec!["AWS"]);
        assert!(ada.details.inputs.profile_complete);
        assert_eq!(ada.standing.score(), 0);
        assert!(ada.details.region.complete_triple().is_some());

        let acme = &profiles[1];
        assert_eq!(acme.role, UserRole::Employer);
        assert_eq!(acme.details.inputs, ScoringInputs::default());
        assert_eq!(acme.created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn rejects_unknown_role_with_line_number() {
        let csv = format!("{HEADER}u-1,employee,,,,,,,,,,,\nu-2,recruiter,,,,,,,,,,,\n");
        match ProfileCsvImporter::from_reader(csv.as_bytes()) {
            Err(ProfileImportError::InvalidRow { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("recruiter"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn parses_plain_dates() {
        let parsed = parse_timestamp("2024-02-29").expect("date parses");
        assert_eq!(parsed.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
