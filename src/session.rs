//! Mutable holder of the group set and start month.
//!
//! Every mutating call returns the new month-zero snapshot and notifies
//! subscribers, so a presentation layer can either use the return value or
//! listen for changes.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::calendar::YearMonth;
use crate::error::{ConfigError, ProjectionError};
use crate::group::{validate_groups, Group, GroupId};
use crate::profile::Profile;
use crate::projection::{ProjectionSettings, Projector};
use crate::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    GroupAdded(GroupId),
    GroupUpdated(GroupId),
    GroupRemoved(GroupId),
    StartChanged(YearMonth),
    ProfileApplied(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SessionEvent, &Snapshot)>;

pub struct Session {
    settings: ProjectionSettings,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Session {
    pub fn new(start: YearMonth) -> Self {
        Self {
            settings: ProjectionSettings::new(start, Vec::new()),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn from_settings(settings: ProjectionSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let mut session = Self::new(settings.start);
        session.settings = settings;
        Ok(session)
    }

    pub fn settings(&self) -> &ProjectionSettings {
        &self.settings
    }

    pub fn groups(&self) -> &[Group] {
        &self.settings.groups
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&SessionEvent, &Snapshot) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn add_group(&mut self, group: Group) -> Result<Snapshot, ConfigError> {
        group.validate()?;
        if self.position(&group.id).is_some() {
            return Err(ConfigError::DuplicateGroupId(group.id));
        }
        let id = group.id.clone();
        self.settings.groups.push(group);
        Ok(self.changed(SessionEvent::GroupAdded(id)))
    }

    pub fn update_group(&mut self, group: Group) -> Result<Snapshot, ConfigError> {
        group.validate()?;
        let index = self
            .position(&group.id)
            .ok_or_else(|| ConfigError::UnknownGroup(group.id.clone()))?;
        let id = group.id.clone();
        self.settings.groups[index] = group;
        Ok(self.changed(SessionEvent::GroupUpdated(id)))
    }

    pub fn remove_group(&mut self, id: &GroupId) -> Result<Snapshot, ConfigError> {
        let index = self
            .position(id)
            .ok_or_else(|| ConfigError::UnknownGroup(id.clone()))?;
        self.settings.groups.remove(index);
        Ok(self.changed(SessionEvent::GroupRemoved(id.clone())))
    }

    pub fn set_start(&mut self, start: YearMonth) -> Snapshot {
        self.settings.start = start;
        self.changed(SessionEvent::StartChanged(start))
    }

    /// Replaces the whole setup with a saved profile.
    pub fn apply_profile(&mut self, profile: &Profile) -> Result<Snapshot, ConfigError> {
        validate_groups(&profile.settings.groups)?;
        self.settings = profile.settings.clone();
        Ok(self.changed(SessionEvent::ProfileApplied(profile.id.clone())))
    }

    pub fn to_profile(&self, id: impl Into<String>, saved_at: DateTime<Utc>) -> Profile {
        Profile::new(id, saved_at, self.settings.clone())
    }

    pub fn month_zero(&self) -> Snapshot {
        self.projector().month_zero()
    }

    /// Projects over a copy of the current setup, so later edits cannot
    /// affect a running projection.
    pub fn projector(&self) -> Projector {
        Projector::from_validated(self.settings.clone())
    }

    pub fn predict(&self, target: NaiveDate) -> Result<Snapshot, ProjectionError> {
        self.projector().predict(target)
    }

    fn position(&self, id: &GroupId) -> Option<usize> {
        self.settings.groups.iter().position(|group| &group.id == id)
    }

    fn changed(&mut self, event: SessionEvent) -> Snapshot {
        let snapshot = self.month_zero();
        debug!(?event, listeners = self.listeners.len(), "session changed");
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event, &snapshot);
        }
        snapshot
    }
}
