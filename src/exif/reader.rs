use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::editor::ExifEditor;
use super::runner::Executor;
use crate::datetime::parse_exif_datetime;
use crate::error::{Error, Result};
use crate::orientation::Orientation;

pub const KEYWORDS_TAG: &str = "Keywords";
pub const ORIENTATION_TAG: &str = "Orientation#";
pub const ORIGINAL_DATE_TAG: &str = "DateTimeOriginal";
pub const MODIFY_DATE_TAG: &str = "FileModifyDate";

impl<E: Executor> ExifEditor<E> {
    /// Value of `tag`, or `None` if the photo does not have it.
    pub fn get_tag(&self, tag: &str) -> Result<Option<Value>> {
        let output = self.run(self.read_command().tag(tag))?;
        let mut record = first_record(&output.stdout)?;
        Ok(take_tag(&mut record, tag))
    }

    /// Value of `tag`, or `default` if the photo does not have it.
    pub fn get_tag_or(&self, tag: &str, default: Value) -> Result<Value> {
        Ok(self.get_tag(tag)?.unwrap_or(default))
    }

    /// Every tag exiftool reports, sorted by name then value.
    ///
    /// With `include_empty` false, tags whose value is empty, zero, false or
    /// null are left out.
    pub fn get_all_tags(&self, include_empty: bool) -> Result<Vec<(String, Value)>> {
        let output = self.run(self.read_command())?;
        let mut tags: Vec<(String, Value)> = first_record(&output.stdout)?
            .into_iter()
            .filter(|(_, value)| include_empty || !is_empty_value(value))
            .collect();
        tags.sort_by(|(a_name, a_val), (b_name, b_val)| {
            a_name
                .cmp(b_name)
                .then_with(|| a_val.to_string().cmp(&b_val.to_string()))
        });
        Ok(tags)
    }

    /// Sorted tag names, see [`get_all_tags`](Self::get_all_tags).
    pub fn get_all_tag_names(&self, include_empty: bool) -> Result<Vec<String>> {
        Ok(self
            .get_all_tags(include_empty)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Every tag as a name → value map.
    pub fn get_all_tags_as_map(&self, include_empty: bool) -> Result<BTreeMap<String, Value>> {
        Ok(self.get_all_tags(include_empty)?.into_iter().collect())
    }

    /// The photo's keywords, sorted.
    pub fn get_keywords(&self) -> Result<Vec<String>> {
        let keywords = match self.get_tag(KEYWORDS_TAG)? {
            None => Vec::new(),
            Some(value) if is_empty_value(&value) => Vec::new(),
            Some(Value::Array(items)) => {
                let mut keywords: Vec<String> = items.iter().map(scalar_to_string).collect();
                keywords.sort();
                keywords
            }
            Some(value) => vec![scalar_to_string(&value)],
        };
        Ok(keywords)
    }

    /// Current orientation. A photo without the tag is [`Orientation::NORMAL`].
    pub fn get_orientation(&self) -> Result<Orientation> {
        match self.get_tag(ORIENTATION_TAG)? {
            None => Ok(Orientation::NORMAL),
            Some(value) => orientation_from_value(&value),
        }
    }

    /// When the picture was taken (`DateTimeOriginal`).
    pub fn get_original_date_time(&self) -> Result<Option<NaiveDateTime>> {
        self.get_date_time_field(ORIGINAL_DATE_TAG)
    }

    /// File modification time (`FileModifyDate`).
    pub fn get_modification_date_time(&self) -> Result<Option<NaiveDateTime>> {
        self.get_date_time_field(MODIFY_DATE_TAG)
    }

    /// Read any date/time tag and parse it strictly.
    pub fn get_date_time_field(&self, field: &str) -> Result<Option<NaiveDateTime>> {
        match self.get_tag(field)? {
            None => Ok(None),
            Some(Value::String(s)) => parse_exif_datetime(&s).map(Some).map_err(|_| {
                Error::UnexpectedOutput(format!("{field} is not a date/time value: '{s}'"))
            }),
            Some(other) => Err(Error::UnexpectedOutput(format!(
                "{field} is not a date/time string: {other}"
            ))),
        }
    }
}

/// exiftool answers `-j` with an array holding one object per file.
fn first_record(stdout: &str) -> Result<Map<String, Value>> {
    let records: Vec<Map<String, Value>> = serde_json::from_str(stdout)?;
    records
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedOutput("empty JSON array".to_string()))
}

/// Tags requested with a `#` suffix (numeric value) come back without it.
fn take_tag(record: &mut Map<String, Value>, tag: &str) -> Option<Value> {
    record.remove(tag).or_else(|| {
        tag.strip_suffix('#')
            .and_then(|bare| record.remove(bare))
    })
}

fn orientation_from_value(value: &Value) -> Result<Orientation> {
    let code = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match code {
        // Some writers store 0 for "unset"
        Some(0) => Ok(Orientation::NORMAL),
        Some(code) => u8::try_from(code)
            .ok()
            .and_then(Orientation::from_code)
            .ok_or_else(|| bad_orientation(value)),
        None => Err(bad_orientation(value)),
    }
}

fn bad_orientation(value: &Value) -> Error {
    Error::UnexpectedOutput(format!("{value} is not an EXIF orientation code"))
}

/// Empty strings, zero, false, null and empty collections.
pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
