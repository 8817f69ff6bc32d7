//! Date resolution for notes.
//!
//! A note's date comes either from a textual front-matter value, tried
//! against an ordered list of formats, or from a file timestamp.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Formats tried in order. US month-first wins over day-first.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d/%m/%Y",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not parse date: {value}")]
pub struct DateParseError {
    pub value: String,
}

/// Input to [`DateResolver::resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateValue<'a> {
    /// Seconds since the Unix epoch.
    Timestamp(f64),
    Text(&'a str),
}

impl<'a> From<&'a str> for DateValue<'a> {
    fn from(value: &'a str) -> Self {
        DateValue::Text(value)
    }
}

impl From<SystemTime> for DateValue<'_> {
    fn from(time: SystemTime) -> Self {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        };
        DateValue::Timestamp(secs)
    }
}

impl fmt::Display for DateValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateValue::Timestamp(secs) => write!(f, "{}", secs),
            DateValue::Text(text) => f.write_str(text),
        }
    }
}

/// One accepted format plus the shape its input must have.
///
/// chrono accepts any number of year digits for `%Y`, so `24-03-01` would
/// parse as year 24. The shape pins field widths the way strptime does.
#[derive(Debug, Clone)]
struct DateFormat {
    pattern: String,
    shape: Regex,
}

impl DateFormat {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            shape: shape_of(pattern),
        }
    }

    fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        if !self.shape.is_match(text) {
            return None;
        }
        NaiveDateTime::parse_from_str(text, &self.pattern)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, &self.pattern)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

fn shape_of(pattern: &str) -> Regex {
    let mut re = String::from("^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            re.push_str(&regex::escape(&c.to_string()));
            continue;
        }
        let piece = match chars.next() {
            Some('Y') => r"[+-]?\d{4}",
            Some('y') | Some('C') => r"\d{2}",
            Some('m') | Some('d') | Some('H') | Some('M') | Some('S') | Some('I') => r"\d{1,2}",
            Some('e') => r"\s?\d{1,2}",
            Some('j') => r"\d{1,3}",
            Some('b') | Some('B') | Some('h') | Some('a') | Some('A') | Some('p') => r"[A-Za-z]+",
            Some('%') => "%",
            _ => ".*?",
        };
        re.push_str(piece);
    }
    re.push('$');
    // Every piece above is escaped or a fixed class.
    Regex::new(&re).unwrap()
}

/// Resolves date values against an ordered list of formats.
#[derive(Debug, Clone)]
pub struct DateResolver {
    formats: Vec<DateFormat>,
}

impl DateResolver {
    pub fn new<S: AsRef<str>>(formats: &[S]) -> Self {
        Self {
            formats: formats.iter().map(|f| DateFormat::new(f.as_ref())).collect(),
        }
    }

    /// Resolve a value to a local date-time.
    ///
    /// ```
    /// use notegraph_core::date::{DateResolver, DateValue};
    ///
    /// let resolver = DateResolver::default();
    /// let date = resolver.resolve(DateValue::Text("03/01/2024")).unwrap();
    /// assert_eq!(date.format("%Y-%m-%d").to_string(), "2024-03-01");
    /// ```
    pub fn resolve(&self, value: DateValue<'_>) -> Result<NaiveDateTime, DateParseError> {
        match value {
            DateValue::Timestamp(secs) => from_timestamp(secs).ok_or_else(|| DateParseError {
                value: value.to_string(),
            }),
            DateValue::Text(text) => {
                let trimmed = text.trim();
                self.formats
                    .iter()
                    .find_map(|format| format.parse(trimmed))
                    .ok_or_else(|| DateParseError {
                        value: text.to_string(),
                    })
            }
        }
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMATS)
    }
}

fn from_timestamp(secs: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        .map(|utc| utc.with_timezone(&Local).naive_local())
}
