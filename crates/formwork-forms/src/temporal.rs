//! Date, date-time and time parsing shared by the temporal field kinds.
//!
//! Temporal fields store their values as strings in fixed storage formats
//! ([`DATETIME_FORMAT`], [`DATE_FORMAT`], [`TIME_FORMAT`]) and accept input
//! in any of their configured input formats, the process-wide formats from
//! [`Settings`](formwork_core::Settings), and the storage format itself.

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use formwork_core::settings::settings;
use formwork_core::value::{DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};
use formwork_core::Value;

/// Which temporal value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    /// A date and time.
    DateTime,
    /// A calendar date.
    Date,
    /// A time of day.
    Time,
}

/// Per-field temporal configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemporalOptions {
    /// Formats tried, in order, before the global and storage formats.
    pub input_formats: Vec<String>,
    /// Format used for the presentation form; the storage format if unset.
    pub output_format: Option<String>,
    /// Default to "now", re-evaluated on every validation.
    pub auto_now: bool,
    /// Default to "now", evaluated once when the field is built.
    pub auto_now_on_create: bool,
}

impl TemporalKind {
    /// The fixed format internal values are stored in.
    pub const fn storage_format(self) -> &'static str {
        match self {
            Self::DateTime => DATETIME_FORMAT,
            Self::Date => DATE_FORMAT,
            Self::Time => TIME_FORMAT,
        }
    }

    /// The noun used in error messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::DateTime => "Datetime",
            Self::Date => "Date",
            Self::Time => "Time",
        }
    }

    /// All formats accepted for input, in the order they are tried.
    pub fn formats(self, options: &TemporalOptions) -> Vec<String> {
        let global = match self {
            Self::DateTime => &settings().datetime_input_formats,
            Self::Date => &settings().date_input_formats,
            Self::Time => &settings().time_input_formats,
        };
        let mut formats: Vec<String> = Vec::new();
        for format in options
            .input_formats
            .iter()
            .chain(global.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.storage_format()))
        {
            if !formats.iter().any(|f| f == format) {
                formats.push(format.to_string());
            }
        }
        formats
    }

    /// The current local time as a value of this kind, to whole seconds.
    pub fn now(self) -> Value {
        let now = chrono::Local::now().naive_local();
        let now = now.with_nanosecond(0).unwrap_or(now);
        match self {
            Self::DateTime => Value::DateTime(now),
            Self::Date => Value::Date(now.date()),
            Self::Time => Value::Time(now.time()),
        }
    }

    /// Converts raw input into a rich temporal value.
    ///
    /// Already-typed values are converted between kinds where that is
    /// lossless in the right direction; strings are tried against each of
    /// `formats`. Returns `None` when nothing matches.
    pub fn parse(self, value: &Value, formats: &[String]) -> Option<Value> {
        match (self, value) {
            (Self::DateTime, Value::DateTime(_))
            | (Self::Date, Value::Date(_))
            | (Self::Time, Value::Time(_)) => Some(value.clone()),
            (Self::DateTime, Value::Date(d)) => d.and_hms_opt(0, 0, 0).map(Value::DateTime),
            (Self::Date, Value::DateTime(dt)) => Some(Value::Date(dt.date())),
            (Self::Time, Value::DateTime(dt)) => Some(Value::Time(dt.time())),
            (_, Value::String(s)) => {
                let s = s.trim();
                formats.iter().find_map(|format| self.parse_str(s, format))
            }
            _ => None,
        }
    }

    fn parse_str(self, s: &str, format: &str) -> Option<Value> {
        match self {
            Self::DateTime => NaiveDateTime::parse_from_str(s, format)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, format)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(Value::DateTime),
            Self::Date => NaiveDate::parse_from_str(s, format)
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, format)
                        .ok()
                        .map(|dt| dt.date())
                })
                .map(Value::Date),
            Self::Time => NaiveTime::parse_from_str(s, format).ok().map(Value::Time),
        }
    }

    /// Formats a rich temporal value with `format`.
    ///
    /// Returns `None` for non-temporal values or formats that do not apply
    /// to the value (such as an hour specifier on a date).
    pub fn format(value: &Value, format: &str) -> Option<String> {
        let mut out = String::new();
        let written = match value {
            Value::DateTime(dt) => write!(out, "{}", dt.format(format)),
            Value::Date(d) => write!(out, "{}", d.format(format)),
            Value::Time(t) => write!(out, "{}", t.format(format)),
            _ => return None,
        };
        written.ok().map(|()| out)
    }
}
