use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calendar::YearMonth;
use crate::group::GroupId;
use crate::transition::PopulationState;

/// Population of every configured group at one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub month: YearMonth,
    pub months_elapsed: u32,
    pub populations: BTreeMap<GroupId, f64>,
}

impl Snapshot {
    pub fn new(month: YearMonth, months_elapsed: u32, populations: PopulationState) -> Self {
        Self {
            month,
            months_elapsed,
            populations,
        }
    }

    pub fn population(&self, id: &GroupId) -> Option<f64> {
        self.populations.get(id).copied()
    }

    pub fn total_population(&self) -> f64 {
        self.populations.values().sum()
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_and_lookup() {
        let mut populations = PopulationState::new();
        populations.insert(GroupId::new("north"), 120.0);
        populations.insert(GroupId::new("south"), 80.5);
        let snapshot = Snapshot::new(YearMonth::new(2024, 1).unwrap(), 0, populations);

        assert_eq!(snapshot.total_population(), 200.5);
        assert_eq!(snapshot.population(&GroupId::new("south")), Some(80.5));
        assert_eq!(snapshot.population(&GroupId::new("east")), None);
    }

    #[test]
    fn writes_pretty_json() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out").join("snapshot.json");
        let mut populations = PopulationState::new();
        populations.insert(GroupId::new("north"), 10.0);
        let snapshot = Snapshot::new(YearMonth::new(2030, 6).unwrap(), 77, populations);

        snapshot.write_json(&path).unwrap();
        let data = fs::read_to_string(&path).unwrap();
        assert!(data.contains("\"month\": \"2030-06\""));
        let back: Snapshot = serde_json::from_str(&data).unwrap();
        assert_eq!(back, snapshot);
    }
}
