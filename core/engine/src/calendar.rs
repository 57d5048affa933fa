//! FILENAME: core/engine/src/calendar.rs
//! PURPOSE: Calendar attributes derived from a transaction date.
//! CONTEXT: Day and month names sort lexically ("April" < "January"), so both
//! enums are declared in canonical order and derive `Ord` from it. Grouping
//! and sorting always go through these enums, never through their names.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// DAY OF WEEK
// ============================================================================

/// Day of the week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// Canonical display order.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_index(date.weekday().num_days_from_monday() as usize)
    }

    /// Monday = 0 .. Sunday = 6. Out-of-range indices wrap.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 7]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl std::fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// MONTH
// ============================================================================

/// Month of the year, January first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn from_date(date: NaiveDate) -> Self {
        Self::ALL[date.month0() as usize]
    }

    /// Looks up a month by its 1-based number.
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1..=12 => Some(Self::ALL[(number - 1) as usize]),
            _ => None,
        }
    }

    /// 1 = January .. 12 = December.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn quarter(self) -> u32 {
        (self.number() + 2) / 3
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// DERIVED FIELDS
// ============================================================================

/// Calendar attributes attached to every fact row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarFields {
    pub day_of_week: DayOfWeek,
    pub month: Month,
    /// 1-12, kept alongside `month` for chronological sorting by consumers
    /// that only see numbers.
    pub month_num: u32,
    /// 1-4
    pub quarter: u32,
    pub year: i32,
}

impl CalendarFields {
    pub fn derive(date: NaiveDate) -> Self {
        let month = Month::from_date(date);
        CalendarFields {
            day_of_week: DayOfWeek::from_date(date),
            month,
            month_num: month.number(),
            quarter: month.quarter(),
            year: date.year(),
        }
    }
}
