use thiserror::Error;

use crate::calendar::YearMonth;
use crate::group::GroupId;

/// Rejected group configuration. Raised before any projection runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("group id must not be empty")]
    EmptyGroupId,
    #[error("group id '{0}' defined more than once")]
    DuplicateGroupId(GroupId),
    #[error("group '{0}' is not configured")]
    UnknownGroup(GroupId),
    #[error("group '{group}': {field} = {value} is invalid, expected {expected}")]
    InvalidParameter {
        group: GroupId,
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("no population groups configured")]
    NoGroupsConfigured,
    #[error("target month {target} precedes start month {start}")]
    InvalidDateRange { start: YearMonth, target: YearMonth },
    #[error("unable to derive month count: {0}")]
    DateArithmeticFailure(String),
    #[error("projection cancelled after {month} month(s)")]
    Cancelled { month: u32 },
}
