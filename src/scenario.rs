use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    calendar::YearMonth,
    error::ConfigError,
    group::Group,
    projection::{ProjectionSettings, Projector},
};

/// A named projection setup as written in a scenario YAML file.
///
/// Keys the model does not use (a group's display color, for instance) are
/// ignored when parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: YearMonth,
    /// Default target month when none is given on the command line.
    #[serde(default)]
    pub target: Option<YearMonth>,
    pub groups: Vec<Group>,
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn settings(&self) -> ProjectionSettings {
        ProjectionSettings::new(self.start, self.groups.clone())
    }

    pub fn projector(&self) -> Result<Projector, ConfigError> {
        Projector::new(self.settings())
    }

    pub fn target(&self, override_target: Option<YearMonth>) -> Option<YearMonth> {
        override_target.or(self.target)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .settings()
            .validate()
            .with_context(|| format!("Invalid groups in {}", path.display()))?;
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
name: hamlet
start: 2024-01
groups:
  - id: hamlet
    label: Hamlet
    initial_population: 120
    color: "#aa3300"
"##;

    #[test]
    fn omitted_parameters_use_defaults() {
        let scenario = Scenario::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(scenario.start, YearMonth::new(2024, 1).unwrap());
        assert_eq!(scenario.target, None);
        let group = &scenario.groups[0];
        assert_eq!(group.life_expectancy_years, 70.0);
        assert_eq!(group.max_wives, 1);
        assert_eq!(group.initial_population, 120.0);
    }

    #[test]
    fn override_target_wins() {
        let mut scenario = Scenario::from_yaml_str(MINIMAL).unwrap();
        let cli = YearMonth::new(2030, 1).unwrap();
        assert_eq!(scenario.target(Some(cli)), Some(cli));
        scenario.target = Some(YearMonth::new(2026, 1).unwrap());
        assert_eq!(scenario.target(None), scenario.target);
    }

    #[test]
    fn loader_rejects_invalid_groups() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("bad.yaml");
        fs::write(
            &path,
            MINIMAL.replace("initial_population: 120", "initial_population: -4"),
        )
        .unwrap();

        let err = ScenarioLoader::new(temp.path()).load("bad.yaml").unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("initial_population"), "{message}");
    }
}
