use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::datetime::{DateTimeValue, format_exif_datetime};
use crate::exif::{Apply, ExifEditor, Executor, MODIFY_DATE_TAG, ORIGINAL_DATE_TAG};
use crate::orientation::Orientation;

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "tif", "tiff", "heic", "heif", "avif",
    // RAW formats
    "cr3", "cr2", "dng", "nef", "arw", "raf", "orf", "rw2", "pef", "srw",
];

/// Which date a date operation reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    /// `DateTimeOriginal`, when the photo was taken.
    Original,
    /// `FileModifyDate`, the filesystem modification time.
    Modified,
}

impl DateField {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Original => ORIGINAL_DATE_TAG,
            Self::Modified => MODIFY_DATE_TAG,
        }
    }
}

/// One editor operation, applied to every file of a batch.
///
/// # Example
///
/// ```rust,no_run
/// use exif_edit::config::Config;
/// use exif_edit::pipeline::{Operation, apply, collect_images};
/// use std::path::PathBuf;
///
/// let config = Config::default();
/// let op = Operation::AddKeywords(vec!["holiday".into()]);
/// for path in collect_images(&[PathBuf::from("./photos")]) {
///     let result = apply(&path, &op, &config);
///     if let Some(err) = result.error {
///         eprintln!("{}: {err}", path.display());
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// All tags as a JSON object.
    Show { include_empty: bool },
    GetTag(String),
    SetTags(Vec<(String, String)>),
    ListKeywords,
    AddKeywords(Vec<String>),
    RemoveKeywords(Vec<String>),
    SetKeywords(Vec<String>),
    ClearKeywords,
    GetOrientation,
    SetOrientation(u8),
    /// Signed degrees, positive is clockwise.
    Rotate(i64),
    MirrorHorizontally,
    MirrorVertically,
    GetDate(DateField),
    /// `None` sets the current time.
    SetDate(DateField, Option<String>),
}

impl Operation {
    /// Whether the operation changes the file.
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Self::Show { .. }
                | Self::GetTag(_)
                | Self::ListKeywords
                | Self::GetOrientation
                | Self::GetDate(_)
        )
    }
}

/// The result of applying an [`Operation`] to a single file.
///
/// `output` is what a read produced (or the new orientation after a rotate or
/// mirror); plain writes leave it empty.
#[derive(Debug, Clone, Serialize)]
pub struct EditResult {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collect supported image files from the given paths.
///
/// Accepts a mix of file paths and directory paths. Directories are walked
/// recursively (following symlinks). Only files with supported image extensions
/// are included.
///
/// # Example
///
/// ```rust,no_run
/// use exif_edit::pipeline::collect_images;
/// use std::path::PathBuf;
///
/// let images = collect_images(&[
///     PathBuf::from("photo.jpg"),       // single file
///     PathBuf::from("./photos/"),        // entire directory
/// ]);
/// println!("Found {} images", images.len());
/// ```
pub fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut images = Vec::new();

    for path in paths {
        if path.is_dir() {
            images.extend(walk_images(path));
        } else if !path.exists() {
            log::warn!("Path does not exist: {}", path.display());
        } else if is_supported_image(path) {
            images.push(path.clone());
        } else {
            log::warn!("Skipping unsupported file: {}", path.display());
        }
    }

    images
}

/// Supported images below `dir`, in file name order.
fn walk_images(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::debug!("Skipping unreadable entry under {}: {e}", dir.display());
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_supported_image(entry.path()))
        .map(walkdir::DirEntry::into_path)
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Apply one operation to one file, with an editor built from `config`.
///
/// Never fails: errors are reported in [`EditResult::error`] so a batch can
/// carry on with the next file.
pub fn apply(path: &Path, op: &Operation, config: &Config) -> EditResult {
    let editor = ExifEditor::from_config(path, config);
    let (output, error) = match run_operation(&editor, op)
        .with_context(|| format!("Failed to edit {}", path.display()))
    {
        Ok(output) => (output, None),
        Err(e) => (None, Some(format!("{e:#}"))),
    };
    EditResult {
        path: path.to_path_buf(),
        output,
        error,
    }
}

/// Run `op` against an existing editor and return its JSON output, if any.
pub fn run_operation<E: Executor>(editor: &ExifEditor<E>, op: &Operation) -> Result<Option<Value>> {
    let output = match op {
        Operation::Show { include_empty } => {
            Some(serde_json::to_value(editor.get_all_tags_as_map(*include_empty)?)?)
        }
        Operation::GetTag(tag) => Some(editor.get_tag(tag)?.unwrap_or(Value::Null)),
        Operation::SetTags(tags) => {
            editor.set_tags(tags.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
            None
        }
        Operation::ListKeywords => Some(json!(editor.get_keywords()?)),
        Operation::AddKeywords(keywords) => {
            editor.add_keywords(keywords)?;
            None
        }
        Operation::RemoveKeywords(keywords) => {
            editor.remove_keywords(keywords)?;
            None
        }
        Operation::SetKeywords(keywords) => {
            editor.set_keywords(keywords)?;
            None
        }
        Operation::ClearKeywords => {
            editor.clear_keywords()?;
            None
        }
        Operation::GetOrientation => Some(orientation_json(editor.get_orientation()?)),
        Operation::SetOrientation(code) => {
            editor.set_orientation_code(*code)?;
            None
        }
        Operation::Rotate(degrees) => {
            Some(orientation_json(editor.rotate(*degrees, Apply::Write)?))
        }
        Operation::MirrorHorizontally => Some(orientation_json(editor.mirror_horizontally()?)),
        Operation::MirrorVertically => Some(orientation_json(editor.mirror_vertically()?)),
        Operation::GetDate(field) => {
            let date = editor.get_date_time_field(field.tag())?;
            Some(json!(date.as_ref().map(format_exif_datetime)))
        }
        Operation::SetDate(field, value) => {
            let value = value.as_deref().map(DateTimeValue::from);
            editor.set_date_time_field(field.tag(), value)?;
            None
        }
    };
    Ok(output)
}

fn orientation_json(orientation: Orientation) -> Value {
    json!({
        "code": orientation.code(),
        "rotation": orientation.rotation().degrees(),
        "mirrored": orientation.is_mirrored(),
    })
}
