use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExposureError;

/// The twelve calendar month names, in order, as accepted on the CLI.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A reporting month.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
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
    /// All months in calendar order.
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

    /// Parse a month from its English name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Month, ExposureError> {
        let trimmed = name.trim();
        Month::ALL
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| ExposureError::UnknownMonth(name.to_string()))
    }

    /// The English month name.
    pub fn name(self) -> &'static str {
        MONTH_NAMES[self.index()]
    }

    /// Zero-based position in the calendar year.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Month {
    type Err = ExposureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::from_name(s)
    }
}

// ── MonthDayTable ─────────────────────────────────────────────────────────────

/// Month → cumulative day-of-year count through the end of that month.
///
/// The default table uses the non-leap-year convention: January=31,
/// February=59, … December=365. The table is a pipeline parameter so the
/// reporting window can be re-based without touching the calculation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthDayTable([u32; 12]);

impl MonthDayTable {
    /// Build a table from explicit cumulative counts, January first.
    pub fn new(cumulative: [u32; 12]) -> Self {
        Self(cumulative)
    }

    /// Cumulative day count through the end of `month`.
    pub fn cumulative_days(&self, month: Month) -> u32 {
        self.0[month.index()]
    }
}

impl Default for MonthDayTable {
    fn default() -> Self {
        Self([31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334, 365])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
