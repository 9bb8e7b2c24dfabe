//! # Trigger Schedule
//!
//! Each trigger produces one run keyed by its logical date. A run for logical
//! date `d` becomes due once its interval has closed, i.e. when the next
//! logical date is on or before today. Intervals are anchored on the start
//! date.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Schedule {
    /// A single run on the start date
    Once,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Schedule {
    /// Logical date of the interval following `date`
    pub fn next_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Once => None,
            Self::Daily => date.checked_add_days(Days::new(1)),
            Self::Weekly => date.checked_add_days(Days::new(7)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
        }
    }

    /// The `index`-th logical date counted from `start`
    ///
    /// Computed from `start` rather than the previous date, so a month that
    /// clamps the day (Jan 31 -> Feb 28) does not shift later runs.
    pub fn nth_logical_date(&self, start: NaiveDate, index: u32) -> Option<NaiveDate> {
        match self {
            Self::Once => (index == 0).then_some(start),
            Self::Daily => start.checked_add_days(Days::new(u64::from(index))),
            Self::Weekly => start.checked_add_days(Days::new(u64::from(index) * 7)),
            Self::Monthly => start.checked_add_months(Months::new(index)),
        }
    }

    /// Every logical date from `start` whose run is due by `today`, oldest first
    pub fn due_logical_dates(&self, start: NaiveDate, today: NaiveDate) -> Vec<NaiveDate> {
        if let Self::Once = self {
            return if start <= today { vec![start] } else { Vec::new() };
        }

        let mut due = Vec::new();
        let mut index = 0u32;
        while let (Some(current), Some(next)) = (
            self.nth_logical_date(start, index),
            index
                .checked_add(1)
                .and_then(|following| self.nth_logical_date(start, following)),
        ) {
            if next > today {
                break;
            }
            due.push(current);
            index += 1;
        }
        due
    }

    /// Most recent logical date whose run is due by `today`
    pub fn latest_due(&self, start: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
        self.due_logical_dates(start, today).last().copied()
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => write!(f, "@once"),
            Self::Daily => write!(f, "@daily"),
            Self::Weekly => write!(f, "@weekly"),
            Self::Monthly => write!(f, "@monthly"),
        }
    }
}

impl FromStr for Schedule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "@once" => Ok(Self::Once),
            "@daily" => Ok(Self::Daily),
            "@weekly" => Ok(Self::Weekly),
            "@monthly" => Ok(Self::Monthly),
            other => Err(format!("Unsupported schedule: {other}")),
        }
    }
}

impl TryFrom<String> for Schedule {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Schedule> for String {
    fn from(schedule: Schedule) -> Self {
        schedule.to_string()
    }
}
