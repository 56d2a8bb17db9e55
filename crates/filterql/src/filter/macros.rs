//! Time macros (`@now`, `@todayStart`, ...) and their expansion.
//!
//! All macros of one compile call are expanded against a single
//! [`MacroClock`] snapshot, so `@now` and `@todayEnd` always agree.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Timelike, Utc};
use serde::Serialize;

use super::value::Value;

/// The fixed macro vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Macro {
    /// Current timestamp.
    Now,
    /// Current second (0-59).
    Second,
    /// Current minute (0-59).
    Minute,
    /// Current hour (0-23).
    Hour,
    /// Current day of the month (1-31).
    Day,
    /// Current month (1-12).
    Month,
    /// Current year.
    Year,
    /// Current day of the week (0 = Sunday).
    Weekday,
    /// Start of the current day.
    TodayStart,
    /// Last instant of the current day.
    TodayEnd,
    /// Start of the current month.
    MonthStart,
    /// Last instant of the current month.
    MonthEnd,
    /// Start of the current year.
    YearStart,
    /// Last instant of the current year.
    YearEnd,
}

impl Macro {
    /// Every macro, in declaration order.
    pub const ALL: [Macro; 14] = [
        Macro::Now,
        Macro::Second,
        Macro::Minute,
        Macro::Hour,
        Macro::Day,
        Macro::Month,
        Macro::Year,
        Macro::Weekday,
        Macro::TodayStart,
        Macro::TodayEnd,
        Macro::MonthStart,
        Macro::MonthEnd,
        Macro::YearStart,
        Macro::YearEnd,
    ];

    /// Looks up a macro by its name (without `@`). Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Returns the macro name without the `@` prefix.
    pub fn name(self) -> &'static str {
        match self {
            Macro::Now => "now",
            Macro::Second => "second",
            Macro::Minute => "minute",
            Macro::Hour => "hour",
            Macro::Day => "day",
            Macro::Month => "month",
            Macro::Year => "year",
            Macro::Weekday => "weekday",
            Macro::TodayStart => "todayStart",
            Macro::TodayEnd => "todayEnd",
            Macro::MonthStart => "monthStart",
            Macro::MonthEnd => "monthEnd",
            Macro::YearStart => "yearStart",
            Macro::YearEnd => "yearEnd",
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name())
    }
}

/// A point in time that macros expand against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroClock {
    now: DateTime<Utc>,
}

impl MacroClock {
    /// Creates a clock fixed at the given instant.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Creates a clock fixed at the current system time.
    pub fn system() -> Self {
        Self::new(Utc::now())
    }

    /// Returns the snapshot instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Expands a macro to a literal value.
    ///
    /// Period boundaries become timestamps; calendar components become integers.
    pub fn expand(&self, m: Macro) -> Value {
        let now = self.now;
        match m {
            Macro::Now => Value::Timestamp(now),
            Macro::Second => Value::Integer(now.second().into()),
            Macro::Minute => Value::Integer(now.minute().into()),
            Macro::Hour => Value::Integer(now.hour().into()),
            Macro::Day => Value::Integer(now.day().into()),
            Macro::Month => Value::Integer(now.month().into()),
            Macro::Year => Value::Integer(now.year().into()),
            Macro::Weekday => Value::Integer(now.weekday().num_days_from_sunday().into()),
            Macro::TodayStart => Value::Timestamp(self.today_start()),
            Macro::TodayEnd => Value::Timestamp(last_instant_before(
                self.today_start() + Duration::days(1),
            )),
            Macro::MonthStart => Value::Timestamp(self.month_start()),
            Macro::MonthEnd => Value::Timestamp(last_instant_before(
                self.month_start() + Months::new(1),
            )),
            Macro::YearStart => Value::Timestamp(self.year_start()),
            Macro::YearEnd => Value::Timestamp(last_instant_before(
                self.year_start() + Months::new(12),
            )),
        }
    }

    fn today_start(&self) -> DateTime<Utc> {
        self.now.date_naive().and_time(NaiveTime::MIN).and_utc()
    }

    fn month_start(&self) -> DateTime<Utc> {
        self.today_start() - Duration::days(self.now.day0().into())
    }

    fn year_start(&self) -> DateTime<Utc> {
        self.today_start() - Duration::days(self.now.ordinal0().into())
    }
}

impl Default for MacroClock {
    fn default() -> Self {
        Self::system()
    }
}

fn last_instant_before(boundary: DateTime<Utc>) -> DateTime<Utc> {
    boundary - Duration::nanoseconds(1)
}
