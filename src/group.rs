use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_life_expectancy_years() -> f64 {
    70.0
}

fn default_sex_ratio() -> f64 {
    0.5
}

fn default_fraction_not_married() -> f64 {
    0.3
}

fn default_avg_children_per_woman() -> f64 {
    2.0
}

fn default_max_wives() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A named sub-population sharing one set of demographic parameters.
///
/// `female_ratio` and `male_ratio` are applied independently; nothing
/// requires them to sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_life_expectancy_years")]
    pub life_expectancy_years: f64,
    #[serde(default = "default_sex_ratio")]
    pub female_ratio: f64,
    #[serde(default = "default_sex_ratio")]
    pub male_ratio: f64,
    #[serde(default = "default_fraction_not_married")]
    pub fraction_not_married: f64,
    #[serde(default = "default_avg_children_per_woman")]
    pub avg_children_per_woman: f64,
    #[serde(default = "default_max_wives")]
    pub max_wives: u32,
    pub initial_population: f64,
}

impl Group {
    pub fn new(id: impl Into<GroupId>, label: impl Into<String>, initial_population: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            life_expectancy_years: default_life_expectancy_years(),
            female_ratio: default_sex_ratio(),
            male_ratio: default_sex_ratio(),
            fraction_not_married: default_fraction_not_married(),
            avg_children_per_woman: default_avg_children_per_woman(),
            max_wives: default_max_wives(),
            initial_population,
        }
    }

    pub fn with_life_expectancy(mut self, years: f64) -> Self {
        self.life_expectancy_years = years;
        self
    }

    pub fn with_sex_ratios(mut self, female: f64, male: f64) -> Self {
        self.female_ratio = female;
        self.male_ratio = male;
        self
    }

    pub fn with_fraction_not_married(mut self, fraction: f64) -> Self {
        self.fraction_not_married = fraction;
        self
    }

    pub fn with_avg_children_per_woman(mut self, children: f64) -> Self {
        self.avg_children_per_woman = children;
        self
    }

    pub fn with_max_wives(mut self, max_wives: u32) -> Self {
        self.max_wives = max_wives;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ConfigError::EmptyGroupId);
        }

        let invalid = |field: &'static str, value: f64, expected: &'static str| {
            ConfigError::InvalidParameter {
                group: self.id.clone(),
                field,
                value,
                expected,
            }
        };

        if !self.life_expectancy_years.is_finite() || self.life_expectancy_years <= 0.0 {
            return Err(invalid(
                "life_expectancy_years",
                self.life_expectancy_years,
                "a positive number of years",
            ));
        }

        for (field, value) in [
            ("female_ratio", self.female_ratio),
            ("male_ratio", self.male_ratio),
            ("fraction_not_married", self.fraction_not_married),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, value, "a fraction between 0 and 1"));
            }
        }

        if !self.avg_children_per_woman.is_finite() || self.avg_children_per_woman < 0.0 {
            return Err(invalid(
                "avg_children_per_woman",
                self.avg_children_per_woman,
                "a non-negative number",
            ));
        }

        if self.max_wives < 1 {
            return Err(invalid(
                "max_wives",
                f64::from(self.max_wives),
                "an integer of at least 1",
            ));
        }

        if !self.initial_population.is_finite() || self.initial_population < 0.0 {
            return Err(invalid(
                "initial_population",
                self.initial_population,
                "a non-negative count",
            ));
        }

        Ok(())
    }
}

/// Validates every group and checks that ids are unique.
pub fn validate_groups(groups: &[Group]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for group in groups {
        group.validate()?;
        if !seen.insert(&group.id) {
            return Err(ConfigError::DuplicateGroupId(group.id.clone()));
        }
    }
    Ok(())
}
