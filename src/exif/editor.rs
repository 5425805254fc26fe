use std::path::{Path, PathBuf};

use super::command::{ExifCommand, OVERWRITE_IN_PLACE};
use super::runner::{Executor, ExifTool, RunOutput, SystemExecutor};
use crate::config::Config;
use crate::error::{Error, Result};

/// Metadata editor bound to a single photo.
///
/// Every method is one or more synchronous exiftool runs; the editor keeps
/// no state between them besides its settings. It takes no lock on the file,
/// so read-modify-write methods ([`remove_keywords`](Self::remove_keywords),
/// [`set_keywords`](Self::set_keywords), the mirror and rotate methods) lose
/// concurrent changes made by anyone else, and a failure between the clear
/// and add steps of `set_keywords` leaves the keywords empty.
///
/// ```rust,no_run
/// use exif_edit::ExifEditor;
/// use exif_edit::exif::Apply;
///
/// # fn main() -> exif_edit::Result<()> {
/// let editor = ExifEditor::new("photo.jpg").save_backup(true);
/// editor.add_keywords(&["beach", "sunset"])?;
/// editor.rotate_clockwise(1, Apply::Write)?;
/// println!("{:?}", editor.get_keywords()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExifEditor<E = SystemExecutor> {
    photo: PathBuf,
    save_backup: bool,
    extra_options: Vec<String>,
    tool: ExifTool<E>,
}

impl ExifEditor<SystemExecutor> {
    pub fn new(photo: impl Into<PathBuf>) -> Self {
        Self::with_tool(photo, ExifTool::new())
    }

    /// Create an editor from a UTF-8 encoded path.
    pub fn from_bytes(photo: &[u8]) -> Result<Self> {
        let photo = std::str::from_utf8(photo)
            .map_err(|e| Error::InvalidArgument(format!("Photo path is not UTF-8: {e}")))?;
        Ok(Self::new(photo))
    }

    /// Create an editor using the tool, backup and option settings of `config`.
    pub fn from_config(photo: impl Into<PathBuf>, config: &Config) -> Self {
        Self::with_tool(photo, ExifTool::from_config(config))
            .save_backup(config.output.save_backup)
            .extra_options(&config.tool.extra_options)
    }
}

impl<E: Executor> ExifEditor<E> {
    pub fn with_tool(photo: impl Into<PathBuf>, tool: ExifTool<E>) -> Self {
        Self {
            photo: photo.into(),
            save_backup: false,
            extra_options: Vec::new(),
            tool,
        }
    }

    /// Keep exiftool's `_original` copy instead of overwriting in place.
    pub fn save_backup(mut self, save_backup: bool) -> Self {
        self.save_backup = save_backup;
        self
    }

    /// Options passed verbatim, one argument each, to every write.
    pub fn extra_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_options = options
            .into_iter()
            .map(|o| o.as_ref().to_string())
            .collect();
        self
    }

    pub fn photo(&self) -> &Path {
        &self.photo
    }

    pub fn saves_backup(&self) -> bool {
        self.save_backup
    }

    pub fn tool(&self) -> &ExifTool<E> {
        &self.tool
    }

    /// Options placed in front of every write: extra options, then the
    /// in-place flag unless backups are kept.
    pub fn write_options(&self) -> Vec<&str> {
        let mut options: Vec<&str> = self.extra_options.iter().map(String::as_str).collect();
        if !self.save_backup {
            options.push(OVERWRITE_IN_PLACE);
        }
        options
    }

    pub(crate) fn read_command(&self) -> ExifCommand {
        ExifCommand::read().json_output()
    }

    pub(crate) fn write_command(&self) -> ExifCommand {
        ExifCommand::write().flags(self.write_options())
    }

    /// Append the photo and run, with the photo as the repair target.
    pub(crate) fn run(&self, command: ExifCommand) -> Result<RunOutput> {
        let command = command.file(&self.photo);
        self.tool.run(&command, Some(&self.photo))
    }
}
