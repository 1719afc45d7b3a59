//! Reporting periods used to filter expenses on the analytics page and in
//! exports, and parsing of dates entered in forms.

use serde::Deserialize;
use time::{Date, Duration, macros::format_description};

use crate::Error;

/// A window of days ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    Week,
    Month,
    Quarter,
    Year,
    All,
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Week,
        Period::Month,
        Period::Quarter,
        Period::Year,
        Period::All,
    ];

    pub fn default_preset() -> Self {
        Self::Month
    }

    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Week => "Last 7 days",
            Self::Month => "Last 30 days",
            Self::Quarter => "Last 90 days",
            Self::Year => "Last 365 days",
            Self::All => "All time",
        }
    }

    fn length_in_days(self) -> Option<i64> {
        match self {
            Self::Week => Some(7),
            Self::Month => Some(30),
            Self::Quarter => Some(90),
            Self::Year => Some(365),
            Self::All => None,
        }
    }

    /// The dates covered by the period when it ends on `today`.
    ///
    /// Returns `None` for [Period::All], which is unbounded.
    pub fn date_range(self, today: Date) -> Option<DateRange> {
        self.length_in_days().map(|days| DateRange {
            start: today - Duration::days(days - 1),
            end: today,
        })
    }
}

/// The range from the first day of the month containing `today` up to `today`.
pub fn month_to_date(today: Date) -> DateRange {
    DateRange {
        start: today.replace_day(1).unwrap_or(today),
        end: today,
    }
}

/// Parse a `YYYY-MM-DD` date, treating a blank string as no date.
pub(crate) fn parse_optional_date(raw: &str) -> Result<Option<Date>, Error> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Ok(None);
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| Error::InvalidDate(raw.to_owned()))
}
