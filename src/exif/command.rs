use std::ffi::OsString;
use std::path::Path;

use crate::datetime::EXIF_DATETIME_FORMAT;

/// Replace the original file instead of leaving an `_original` copy.
pub const OVERWRITE_IN_PLACE: &str = "-overwrite_original_in_place";

/// One exiftool invocation.
///
/// `args` is what gets spawned, without any shell in between. `display` is
/// the same command written the way it would be typed into a shell, and is
/// only used for logging and dry runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifCommand {
    args: Vec<OsString>,
    display: Vec<String>,
    mutating: bool,
}

impl ExifCommand {
    /// A command that only reads metadata.
    pub fn read() -> Self {
        Self {
            args: Vec::new(),
            display: Vec::new(),
            mutating: false,
        }
    }

    /// A command that rewrites the file.
    pub fn write() -> Self {
        Self {
            mutating: true,
            ..Self::read()
        }
    }

    /// Strip every tag and copy them back from the original, which makes
    /// exiftool rebuild a damaged EXIF directory.
    pub fn repair(path: &Path) -> Self {
        Self::write()
            .flags([OVERWRITE_IN_PLACE, "-all=", "-tagsfromfile", "@", "-all:all", "-unsafe"])
            .file(path)
    }

    pub fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.into());
        self.display.push(flag.to_string());
        self
    }

    pub fn flags<I, S>(self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        flags
            .into_iter()
            .fold(self, |cmd, flag| cmd.flag(flag.as_ref()))
    }

    /// `-j -d "%Y:%m:%d %H:%M:%S"`
    pub fn json_output(mut self) -> Self {
        self.args.extend([
            OsString::from("-j"),
            OsString::from("-d"),
            OsString::from(EXIF_DATETIME_FORMAT),
        ]);
        self.display.extend([
            "-j".to_string(),
            "-d".to_string(),
            format!("\"{EXIF_DATETIME_FORMAT}\""),
        ]);
        self
    }

    /// Request a single tag: `-TAG`.
    pub fn tag(self, tag: &str) -> Self {
        self.flag(&format!("-{tag}"))
    }

    /// `-TAG="value"`, with double quotes in the value escaped for display.
    pub fn assign(mut self, tag: &str, value: &str) -> Self {
        self.args.push(format!("-{tag}={value}").into());
        self.display
            .push(format!("-{tag}=\"{}\"", escape_quotes(value)));
        self
    }

    /// `-TAG='value'`, used for orientation codes and date/time values.
    pub fn assign_literal(mut self, tag: &str, value: &str) -> Self {
        self.args.push(format!("-{tag}={value}").into());
        self.display.push(format!("-{tag}='{value}'"));
        self
    }

    /// `-iptc:keywords+=keyword`, adding to the list instead of replacing it.
    pub fn add_keyword(mut self, keyword: &str) -> Self {
        self.args.push(format!("-iptc:keywords+={keyword}").into());
        self.display
            .push(format!("-iptc:keywords+={}", escape_keyword(keyword)));
        self
    }

    pub fn file(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_owned());
        self.display.push(format!("\"{}\"", path.display()));
        self
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn is_mutating(&self) -> bool {
        self.mutating
    }

    /// Shell form of the command, e.g. `exiftool -j -d "%Y:%m:%d %H:%M:%S" -Keywords "a.jpg"`.
    pub fn render(&self, program: &str) -> String {
        std::iter::once(program)
            .chain(self.display.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Backslash-escape double quotes inside a double-quoted value.
pub fn escape_quotes(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// Backslash-escape spaces and ampersands in an unquoted keyword.
pub fn escape_keyword(keyword: &str) -> String {
    keyword.replace(' ', "\\ ").replace('&', "\\&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &ExifCommand) -> Vec<String> {
        cmd.args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn tag_read_shape() {
        let cmd = ExifCommand::read()
            .json_output()
            .tag("Keywords")
            .file(Path::new("photo.jpg"));
        assert_eq!(
            cmd.render("exiftool"),
            r#"exiftool -j -d "%Y:%m:%d %H:%M:%S" -Keywords "photo.jpg""#
        );
        assert_eq!(
            args(&cmd),
            ["-j", "-d", "%Y:%m:%d %H:%M:%S", "-Keywords", "photo.jpg"]
        );
        assert!(!cmd.is_mutating());
    }

    #[test]
    fn orientation_write_shape() {
        let cmd = ExifCommand::write()
            .flag(OVERWRITE_IN_PLACE)
            .assign_literal("Orientation#", "6")
            .file(Path::new("photo.jpg"));
        assert_eq!(
            cmd.render("exiftool"),
            r#"exiftool -overwrite_original_in_place -Orientation#='6' "photo.jpg""#
        );
        assert_eq!(
            args(&cmd),
            ["-overwrite_original_in_place", "-Orientation#=6", "photo.jpg"]
        );
        assert!(cmd.is_mutating());
    }

    #[test]
    fn tag_values_escape_quotes_only_for_display() {
        let cmd = ExifCommand::write().assign("Title", r#"say "cheese""#);
        assert_eq!(cmd.render("exiftool"), r#"exiftool -Title="say \"cheese\"""#);
        assert_eq!(args(&cmd), [r#"-Title=say "cheese""#]);
    }

    #[test]
    fn keywords_escape_spaces_and_ampersands_only_for_display() {
        let cmd = ExifCommand::write().add_keyword("salt & pepper");
        assert_eq!(
            cmd.render("exiftool"),
            r"exiftool -iptc:keywords+=salt\ \&\ pepper"
        );
        assert_eq!(args(&cmd), ["-iptc:keywords+=salt & pepper"]);
    }

    #[test]
    fn repair_shape() {
        let cmd = ExifCommand::repair(Path::new("broken.jpg"));
        assert_eq!(
            cmd.render("exiftool"),
            r#"exiftool -overwrite_original_in_place -all= -tagsfromfile @ -all:all -unsafe "broken.jpg""#
        );
    }

    #[test]
    fn shell_metacharacters_stay_literal_in_args() {
        let cmd = ExifCommand::write()
            .assign("Comment", "$(rm -rf ~); `x`")
            .file(Path::new("a b;c.jpg"));
        assert_eq!(args(&cmd), ["-Comment=$(rm -rf ~); `x`", "a b;c.jpg"]);
    }
}
