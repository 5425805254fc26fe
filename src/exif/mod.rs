//! Metadata editing through the exiftool command-line program.
//!
//! - [`ExifTool`] runs one [`ExifCommand`] and interprets exiftool's stderr:
//!   missing tool, benign warnings, damaged EXIF directories (repaired and
//!   retried once), and real failures.
//! - [`ExifEditor`] is bound to one photo and offers the tag, keyword,
//!   orientation and date operations on top of it.
//!
//! Process spawning sits behind the [`Executor`] trait so the editor can be
//! driven by something other than a real `exiftool` binary.

mod command;
mod editor;
mod reader;
mod runner;
mod writer;

pub use command::{ExifCommand, OVERWRITE_IN_PLACE};
pub use editor::ExifEditor;
pub use reader::{KEYWORDS_TAG, MODIFY_DATE_TAG, ORIENTATION_TAG, ORIGINAL_DATE_TAG};
pub use runner::{Executor, ExifTool, ProcessOutput, RunOutput, SystemExecutor};
pub use writer::{Apply, TagValue};
