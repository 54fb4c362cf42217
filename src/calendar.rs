//! Calendar-month arithmetic used to anchor projections.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A calendar month. Day-of-month is deliberately not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("month {0} is outside 1..=12")]
    MonthOutOfRange(u32),
    #[error("unable to parse calendar month from '{0}' (expected YYYY-MM or YYYY-MM-DD)")]
    Unparseable(String),
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        if !(1..=12).contains(&month) {
            return Err(CalendarError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Signed number of whole months from `self` to `later`.
    ///
    /// Negative when `later` is an earlier month. `None` only if the
    /// intermediate arithmetic overflows.
    pub fn months_until(self, later: YearMonth) -> Option<i64> {
        let years = i64::from(later.year).checked_sub(i64::from(self.year))?;
        let months = i64::from(later.month) - i64::from(self.month);
        years.checked_mul(12)?.checked_add(months)
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl FromStr for YearMonth {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(date.into());
        }
        NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .map(YearMonth::from)
            .map_err(|_| CalendarError::Unparseable(trimmed.to_string()))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = CalendarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
