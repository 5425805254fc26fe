use regex::Regex;
use std::sync::LazyLock;

use super::editor::ExifEditor;
use super::reader::{KEYWORDS_TAG, MODIFY_DATE_TAG, ORIENTATION_TAG, ORIGINAL_DATE_TAG};
use super::runner::Executor;
use crate::datetime::{DateTimeValue, format_exif_datetime};
use crate::error::{Error, Result};
use crate::orientation::{Orientation, check_right_angle};

/// A value to write into a tag. A `List` becomes one assignment per item,
/// which is how exiftool sets list-type tags.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Integer(i64),
    Float(f64),
    List(Vec<TagValue>),
}

impl TagValue {
    /// The individual values to assign, lists flattened.
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::Text(s) => vec![s.clone()],
            Self::Integer(i) => vec![i.to_string()],
            Self::Float(f) => vec![f.to_string()],
            Self::List(items) => items.iter().flat_map(TagValue::items).collect(),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for TagValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<i64> for TagValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for TagValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for TagValue {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for TagValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl<T: Into<TagValue>> From<Vec<T>> for TagValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Whether to write a computed orientation or only return it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apply {
    Write,
    ComputeOnly,
}

impl<E: Executor> ExifEditor<E> {
    /// Set `tag` to `value`.
    ///
    /// If exiftool says the tag does not exist, a "Tag 'X' is invalid."
    /// notice is logged and the call still succeeds.
    pub fn set_tag(&self, tag: &str, value: impl Into<TagValue>) -> Result<()> {
        self.set_tags([(tag, value)])
    }

    /// Set several tags in one exiftool run.
    ///
    /// An unknown tag is reported the same way as in [`set_tag`](Self::set_tag),
    /// naming whichever tag exiftool's warning names.
    ///
    /// Passing no tags at all is an [`Error::InvalidArgument`]; exiftool is
    /// not run.
    pub fn set_tags<I, K, V>(&self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<TagValue>,
    {
        if let Some(tag) = self.write_tags(tags)? {
            log::warn!("{}", invalid_tag_notice(&tag));
        }
        Ok(())
    }

    /// Run the assignments; returns the tag exiftool rejected, if any.
    pub(crate) fn write_tags<I, K, V>(&self, tags: I) -> Result<Option<String>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<TagValue>,
    {
        let mut command = self.write_command();
        let mut last_tag = None;
        for (tag, value) in tags {
            let tag = tag.as_ref();
            for item in value.into().items() {
                command = command.assign(tag, &item);
            }
            last_tag = Some(tag.to_string());
        }
        let Some(last_tag) = last_tag else {
            return Err(Error::InvalidArgument("no tags given to set".to_string()));
        };

        let output = self.run(command)?;
        Ok(output.warning.as_deref().and_then(|warning| {
            rejected_tag(warning).map(|named| named.unwrap_or(last_tag))
        }))
    }

    pub fn add_keyword(&self, keyword: &str) -> Result<()> {
        self.add_keywords(&[keyword])
    }

    /// Append keywords, keeping the ones already there.
    pub fn add_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> Result<()> {
        if keywords.is_empty() {
            return Ok(());
        }
        let command = keywords
            .iter()
            .fold(self.write_command(), |cmd, kw| cmd.add_keyword(kw.as_ref()));
        self.run(command)?;
        Ok(())
    }

    /// Replace all keywords. Clears, then adds; not atomic.
    pub fn set_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> Result<()> {
        self.clear_keywords()?;
        self.add_keywords(keywords)
    }

    pub fn clear_keywords(&self) -> Result<()> {
        self.set_tag(KEYWORDS_TAG, "")
    }

    pub fn remove_keyword(&self, keyword: &str) -> Result<()> {
        self.remove_keywords(&[keyword])
    }

    /// Remove keywords if present. Keywords the photo does not have are
    /// ignored, and nothing is written if none of them were there.
    pub fn remove_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> Result<()> {
        let mut current = self.get_keywords()?;
        let before = current.len();
        for keyword in keywords {
            if let Some(pos) = current.iter().position(|k| k == keyword.as_ref()) {
                current.remove(pos);
            }
        }
        if current.len() == before {
            log::debug!("No keywords to remove from {}", self.photo().display());
            return Ok(());
        }
        self.set_keywords(&current)
    }

    pub fn set_orientation(&self, orientation: Orientation) -> Result<()> {
        let code = orientation.code().to_string();
        self.run(self.write_command().assign_literal(ORIENTATION_TAG, &code))?;
        Ok(())
    }

    /// Write a raw orientation code, which must be in `1..=8`.
    pub fn set_orientation_code(&self, code: u8) -> Result<()> {
        let orientation = Orientation::from_code(code).ok_or_else(|| {
            Error::InvalidArgument(format!("Orientation code must be 1 to 8, got {code}"))
        })?;
        self.set_orientation(orientation)
    }

    /// Rotate right by `steps` quarter turns.
    pub fn rotate_clockwise(&self, steps: i64, apply: Apply) -> Result<Orientation> {
        self.rotate(quarter_turns_to_degrees(steps)?, apply)
    }

    /// Rotate left by `steps` quarter turns.
    pub fn rotate_counter_clockwise(&self, steps: i64, apply: Apply) -> Result<Orientation> {
        self.rotate(-quarter_turns_to_degrees(steps)?, apply)
    }

    /// Rotate by a signed multiple of 90 degrees (positive is clockwise).
    pub fn rotate(&self, degrees: i64, apply: Apply) -> Result<Orientation> {
        check_right_angle(degrees)?;
        let rotated = self.get_orientation()?.rotated(degrees)?;
        if apply == Apply::Write {
            self.set_orientation(rotated)?;
        }
        Ok(rotated)
    }

    /// Flip top to bottom: a half turn plus a mirror, written once.
    pub fn mirror_vertically(&self) -> Result<Orientation> {
        let flipped = self.rotate(180, Apply::ComputeOnly)?.mirrored();
        self.set_orientation(flipped)?;
        Ok(flipped)
    }

    /// Flip left to right.
    pub fn mirror_horizontally(&self) -> Result<Orientation> {
        let flipped = self.get_orientation()?.mirrored();
        self.set_orientation(flipped)?;
        Ok(flipped)
    }

    /// Set `DateTimeOriginal`; `None` means now.
    pub fn set_original_date_time(&self, value: Option<DateTimeValue>) -> Result<()> {
        self.set_date_time_field(ORIGINAL_DATE_TAG, value)
    }

    /// Set `FileModifyDate`; `None` means now, like `touch`.
    pub fn set_modification_date_time(&self, value: Option<DateTimeValue>) -> Result<()> {
        self.set_date_time_field(MODIFY_DATE_TAG, value)
    }

    pub fn set_date_time_field(&self, field: &str, value: Option<DateTimeValue>) -> Result<()> {
        let formatted = match value {
            Some(value) => value.to_exif_string()?,
            None => format_exif_datetime(&chrono::Local::now().naive_local()),
        };
        self.run(self.write_command().assign_literal(field, &formatted))?;
        Ok(())
    }
}

fn quarter_turns_to_degrees(steps: i64) -> Result<i64> {
    steps
        .checked_mul(90)
        .ok_or_else(|| Error::InvalidArgument(format!("Too many quarter turns: {steps}")))
}

static REJECTED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Warning: Tag (?:'([^']*)' )?(?:does not exist|is not defined)")
        .expect("rejected tag pattern is a valid regex")
});

/// Recognise `Warning: Tag 'X' does not exist` (or `is not defined`).
///
/// `Some(Some(name))` when the tag is named, `Some(None)` when the warning is
/// about an unknown tag but the name cannot be read from it.
fn rejected_tag(warning: &str) -> Option<Option<String>> {
    let captures = REJECTED_TAG.captures(warning.trim())?;
    let name = captures
        .get(1)
        .map(|m| m.as_str().to_string())
        .filter(|name| !name.is_empty());
    Some(name)
}

fn invalid_tag_notice(tag: &str) -> String {
    format!("Tag '{tag}' is invalid.")
}
