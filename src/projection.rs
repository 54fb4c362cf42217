//! Multi-month projection driver.

use std::ops::ControlFlow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::calendar::YearMonth;
use crate::error::{ConfigError, ProjectionError};
use crate::group::{validate_groups, Group};
use crate::snapshot::Snapshot;
use crate::transition::{initial_state, transition, PopulationState};

/// Start month plus the group set; together they anchor month zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSettings {
    pub start: YearMonth,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl ProjectionSettings {
    pub fn new(start: YearMonth, groups: Vec<Group>) -> Self {
        Self { start, groups }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_groups(&self.groups)
    }
}

/// Runs projections over a frozen, validated group set.
///
/// An empty group set is accepted here and reported by the prediction calls.
#[derive(Debug, Clone)]
pub struct Projector {
    settings: ProjectionSettings,
}

impl Projector {
    pub fn new(settings: ProjectionSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub(crate) fn from_validated(settings: ProjectionSettings) -> Self {
        Self { settings }
    }

    pub fn start(&self) -> YearMonth {
        self.settings.start
    }

    pub fn groups(&self) -> &[Group] {
        &self.settings.groups
    }

    pub fn month_zero(&self) -> Snapshot {
        Snapshot::new(self.start(), 0, initial_state(self.groups()))
    }

    /// Whole months between the start month and `target`.
    pub fn months_to(&self, target: YearMonth) -> Result<u32, ProjectionError> {
        let start = self.start();
        let months = start.months_until(target).ok_or_else(|| {
            ProjectionError::DateArithmeticFailure(format!(
                "month distance from {start} to {target} overflows"
            ))
        })?;
        if months < 0 {
            return Err(ProjectionError::InvalidDateRange { start, target });
        }
        u32::try_from(months).map_err(|_| {
            ProjectionError::DateArithmeticFailure(format!(
                "{months} months between {start} and {target} exceeds the supported range"
            ))
        })
    }

    /// Populations at the calendar month containing `target`.
    ///
    /// Any day in the start month, including one before the start day,
    /// yields the month-zero snapshot.
    pub fn predict(&self, target: NaiveDate) -> Result<Snapshot, ProjectionError> {
        self.predict_month(target.into())
    }

    pub fn predict_month(&self, target: YearMonth) -> Result<Snapshot, ProjectionError> {
        self.predict_with_hook(target, |_, _| ControlFlow::Continue(()))
    }

    /// Like [`Projector::predict_month`], calling `hook` after every monthly
    /// transition with the month number (starting at 1) and the new state.
    ///
    /// Returning `ControlFlow::Break` stops the run with
    /// [`ProjectionError::Cancelled`]; no partial snapshot is produced.
    pub fn predict_with_hook<F>(
        &self,
        target: YearMonth,
        mut hook: F,
    ) -> Result<Snapshot, ProjectionError>
    where
        F: FnMut(u32, &PopulationState) -> ControlFlow<()>,
    {
        let groups = self.groups();
        if groups.is_empty() {
            return Err(ProjectionError::NoGroupsConfigured);
        }

        let months = self.months_to(target)?;
        debug!(
            start = %self.start(),
            %target,
            months,
            groups = groups.len(),
            "projecting population"
        );
        if months == 0 {
            return Ok(self.month_zero());
        }

        let mut state = initial_state(groups);
        for month in 1..=months {
            state = transition(&state, groups);
            trace!(month, total = state.values().sum::<f64>(), "month advanced");
            if hook(month, &state).is_break() {
                debug!(month, "projection cancelled by hook");
                return Err(ProjectionError::Cancelled { month });
            }
        }

        let snapshot = Snapshot::new(target, months, state);
        debug!(
            %target,
            total = snapshot.total_population(),
            "projection complete"
        );
        Ok(snapshot)
    }
}
