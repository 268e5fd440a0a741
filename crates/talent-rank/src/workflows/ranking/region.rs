use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{Region, UserProfile};

/// Region filter used to partition employees. Components narrow from country to city.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(default)]
pub struct RegionScope {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegionQueryError {
    #[error("region scope requires a country")]
    MissingCountry,
    #[error("state given without a country")]
    StateWithoutCountry,
    #[error("city given without a state")]
    CityWithoutState,
    #[error("region component `{component}` is blank")]
    BlankComponent { component: &'static str },
    #[error("ranks are assigned per city; `{scope}` does not name a city")]
    NotCityScope { scope: String },
}

impl RegionScope {
    pub fn country(country: &str) -> Self {
        Self {
            country: Some(country.to_string()),
            ..Self::default()
        }
    }

    pub fn state(country: &str, state: &str) -> Self {
        Self {
            country: Some(country.to_string()),
            state: Some(state.to_string()),
            city: None,
        }
    }

    pub fn city(country: &str, state: &str, city: &str) -> Self {
        Self {
            country: Some(country.to_string()),
            state: Some(state.to_string()),
            city: Some(city.to_string()),
        }
    }

    /// Scope covering exactly the profile's city, when its location is fully known.
    pub fn for_region(region: &Region) -> Option<Self> {
        region
            .complete_triple()
            .map(|(country, state, city)| Self::city(country, state, city))
    }

    pub fn validate(&self) -> Result<(), RegionQueryError> {
        for (component, value) in [
            ("country", &self.country),
            ("state", &self.state),
            ("city", &self.city),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(RegionQueryError::BlankComponent { component });
            }
        }

        match (&self.country, &self.state, &self.city) {
            (None, Some(_), _) => Err(RegionQueryError::StateWithoutCountry),
            (None, None, _) => Err(RegionQueryError::MissingCountry),
            (Some(_), None, Some(_)) => Err(RegionQueryError::CityWithoutState),
            _ => Ok(()),
        }
    }

    /// Write-path check: ranks are only ever produced for a full (country, state, city) triple.
    pub fn validate_rank_scope(&self) -> Result<(), RegionQueryError> {
        self.validate()?;
        if self.city.is_none() {
            return Err(RegionQueryError::NotCityScope {
                scope: self.to_string(),
            });
        }
        Ok(())
    }

    /// Exact-match filter over an employee's region. Unset components match anything.
    pub fn matches(&self, region: &Region) -> bool {
        component_matches(&self.country, &region.country)
            && component_matches(&self.state, &region.state)
            && component_matches(&self.city, &region.city)
    }
}

fn component_matches(filter: &Option<String>, value: &Option<String>) -> bool {
    match filter {
        Some(expected) => value.as_deref() == Some(expected.as_str()),
        None => true,
    }
}

impl fmt::Display for RegionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.city, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();
        if parts.is_empty() {
            f.write_str("<unscoped>")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Ranking order: score descending, then earlier signup, then user id.
pub fn ranking_order(a: &UserProfile, b: &UserProfile) -> Ordering {
    b.standing
        .score()
        .cmp(&a.standing.score())
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
