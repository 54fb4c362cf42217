//! Saved projection setups.
//!
//! Persistence is an injected capability: callers hand a [`ProfileStore`] to
//! whatever needs it, and tests use [`MemoryProfileStore`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::projection::ProjectionSettings;

/// A configuration bundle keyed by id and save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub saved_at: DateTime<Utc>,
    pub settings: ProjectionSettings,
}

impl Profile {
    pub fn new(id: impl Into<String>, saved_at: DateTime<Utc>, settings: ProjectionSettings) -> Self {
        Self {
            id: id.into(),
            saved_at,
            settings,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid profile id '{0}' (use letters, digits, '-' or '_')")]
    InvalidId(String),
    #[error("profile {path} stores id '{id}', which does not match its file name")]
    IdMismatch { path: PathBuf, id: String },
}

pub trait ProfileStore {
    /// Every stored profile, oldest save first.
    fn load_all(&self) -> Result<Vec<Profile>, ProfileError>;
    /// Inserts or replaces the profile with the same id.
    fn save(&mut self, profile: Profile) -> Result<(), ProfileError>;
    /// Returns whether a profile was removed.
    fn delete(&mut self, id: &str) -> Result<bool, ProfileError>;

    fn load(&self, id: &str) -> Result<Option<Profile>, ProfileError> {
        Ok(self.load_all()?.into_iter().find(|profile| profile.id == id))
    }
}

fn check_id(id: &str) -> Result<(), ProfileError> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ProfileError::InvalidId(id.to_string()))
    }
}

fn sort_profiles(profiles: &mut [Profile]) {
    profiles.sort_by(|a, b| a.saved_at.cmp(&b.saved_at).then_with(|| a.id.cmp(&b.id)));
}

#[derive(Debug, Default, Clone)]
pub struct MemoryProfileStore {
    profiles: BTreeMap<String, Profile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load_all(&self) -> Result<Vec<Profile>, ProfileError> {
        let mut profiles: Vec<Profile> = self.profiles.values().cloned().collect();
        sort_profiles(&mut profiles);
        Ok(profiles)
    }

    fn save(&mut self, profile: Profile) -> Result<(), ProfileError> {
        check_id(&profile.id)?;
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, ProfileError> {
        Ok(self.profiles.remove(id).is_some())
    }
}

/// Stores each profile as `<dir>/<id>.json`.
pub struct JsonDirProfileStore {
    dir: PathBuf,
}

impl JsonDirProfileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Parses one profile file; its id must equal the file stem.
    fn read_profile(path: &Path) -> Result<Profile, ProfileError> {
        let data = fs::read_to_string(path)?;
        let profile: Profile = serde_json::from_str(&data).map_err(|source| ProfileError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if path.file_stem().and_then(|stem| stem.to_str()) != Some(profile.id.as_str()) {
            return Err(ProfileError::IdMismatch {
                path: path.to_path_buf(),
                id: profile.id,
            });
        }
        Ok(profile)
    }
}

impl ProfileStore for JsonDirProfileStore {
    fn load_all(&self) -> Result<Vec<Profile>, ProfileError> {
        let mut profiles = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            profiles.push(Self::read_profile(&path)?);
        }
        sort_profiles(&mut profiles);
        Ok(profiles)
    }

    fn save(&mut self, profile: Profile) -> Result<(), ProfileError> {
        check_id(&profile.id)?;
        let path = self.path_for(&profile.id);
        let json = serde_json::to_string_pretty(&profile).map_err(|source| ProfileError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json)?;
        info!(id = %profile.id, path = %path.display(), "profile saved");
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, ProfileError> {
        check_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!(id, "profile deleted");
        Ok(true)
    }

    fn load(&self, id: &str) -> Result<Option<Profile>, ProfileError> {
        check_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_profile(&path).map(Some)
    }
}
