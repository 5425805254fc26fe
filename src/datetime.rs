//! The fixed date/time format exiftool is asked to read and write.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// `strftime` pattern passed to `exiftool -d` and used for every date write.
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d";

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}:[01]\d:[0-3]\d$").expect("date pattern is a valid regex")
});

static DATETIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}:[01]\d:[0-3]\d [0-2]\d:[0-5]\d:[0-5]\d$")
        .expect("date/time pattern is a valid regex")
});

/// A date/time value to write into a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateTimeValue {
    DateTime(NaiveDateTime),
    /// Written as midnight of that day.
    Date(NaiveDate),
    /// `YYYY:MM:DD` or `YYYY:MM:DD HH:MM:SS`.
    Text(String),
}

impl DateTimeValue {
    /// Render in [`EXIF_DATETIME_FORMAT`].
    pub fn to_exif_string(&self) -> Result<String> {
        match self {
            Self::DateTime(dt) => Ok(format_exif_datetime(dt)),
            Self::Date(d) => Ok(format!("{} 00:00:00", d.format(EXIF_DATE_FORMAT))),
            Self::Text(s) => normalize_exif_datetime(s),
        }
    }
}

impl From<NaiveDateTime> for DateTimeValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<NaiveDate> for DateTimeValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<&str> for DateTimeValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DateTimeValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

pub fn format_exif_datetime(dt: &NaiveDateTime) -> String {
    dt.format(EXIF_DATETIME_FORMAT).to_string()
}

/// Parse a value exiftool produced with `-d "%Y:%m:%d %H:%M:%S"`.
///
/// The whole string must have exactly that shape; nothing is inferred from a
/// partial match.
pub fn parse_exif_datetime(s: &str) -> Result<NaiveDateTime> {
    if !DATETIME_PATTERN.is_match(s) {
        return Err(incorrect(s));
    }
    NaiveDateTime::parse_from_str(s, EXIF_DATETIME_FORMAT).map_err(|_| incorrect(s))
}

/// Accept `YYYY:MM:DD` (padded to midnight) or `YYYY:MM:DD HH:MM:SS`.
pub fn normalize_exif_datetime(s: &str) -> Result<String> {
    if DATE_PATTERN.is_match(s) {
        Ok(format!("{s} 00:00:00"))
    } else if DATETIME_PATTERN.is_match(s) {
        Ok(s.to_string())
    } else {
        Err(incorrect(s))
    }
}

fn incorrect(s: &str) -> Error {
    Error::InvalidArgument(format!("Incorrect datetime value '{s}' received"))
}
