use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use super::command::ExifCommand;
use crate::config::Config;
use crate::error::{Error, Result};

// Prefixes exiftool puts on its stderr diagnostics
const BAD_DIRECTORY_WARNING: &str = "Warning: Bad ExifIFD directory";
const WARNING_PREFIX: &str = "Warning:";

/// Captured output of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs a program to completion and captures both output streams.
///
/// [`SystemExecutor`] is the real implementation; tests substitute their own
/// to script exiftool's answers.
pub trait Executor {
    fn execute(&self, program: &OsStr, args: &[OsString]) -> io::Result<ProcessOutput>;
}

/// Spawns the program directly with [`std::process::Command`], no shell involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(&self, program: &OsStr, args: &[OsString]) -> io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;
        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Result of a successful exiftool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    /// A benign warning exiftool printed; it has already been logged.
    pub warning: Option<String>,
}

/// Runs exiftool commands and sorts out what its stderr means.
///
/// exiftool writes to stderr for plenty of successful runs, so non-empty
/// stderr is classified rather than treated as failure:
///
/// 1. `<program>: command not found` → [`Error::ToolNotInstalled`]
/// 2. `Warning: Bad ExifIFD directory` on a command tied to a file → the file
///    is repaired once and the command re-run once
/// 3. any other `Warning:` → logged, the run succeeds
/// 4. anything else → [`Error::ToolInvocationFailed`]
#[derive(Debug)]
pub struct ExifTool<E = SystemExecutor> {
    program: OsString,
    executor: E,
    repair: bool,
    dry_run: bool,
    installed: OnceLock<bool>,
}

impl ExifTool<SystemExecutor> {
    pub fn new() -> Self {
        Self::with_executor(SystemExecutor)
    }

    /// Build a runner from the `tool` and `output` sections of a config.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .program(&config.tool.path)
            .repair_damaged_directories(config.tool.repair_damaged_directories)
            .dry_run(config.output.dry_run)
    }
}

impl Default for ExifTool<SystemExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Executor> ExifTool<E> {
    pub fn with_executor(executor: E) -> Self {
        Self {
            program: OsString::from("exiftool"),
            executor,
            repair: true,
            dry_run: false,
            installed: OnceLock::new(),
        }
    }

    /// Path or name of the exiftool binary.
    pub fn program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repair_damaged_directories(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    /// Print mutating commands instead of running them. Reads still run.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Whether `exiftool -ver` runs cleanly. Evaluated once, on first use.
    pub fn is_installed(&self) -> bool {
        *self.installed.get_or_init(|| {
            match self.executor.execute(&self.program, &[OsString::from("-ver")]) {
                Ok(out) => out.stderr.is_empty() && !out.stdout.is_empty(),
                Err(e) => {
                    log::debug!("exiftool availability check failed: {e}");
                    false
                }
            }
        })
    }

    /// Run `command`. When `retry_path` is given, a damaged EXIF directory in
    /// that file is repaired and the command retried once.
    pub fn run(&self, command: &ExifCommand, retry_path: Option<&Path>) -> Result<RunOutput> {
        self.run_once(command, retry_path, true)
    }

    fn run_once(
        &self,
        command: &ExifCommand,
        retry_path: Option<&Path>,
        retry: bool,
    ) -> Result<RunOutput> {
        let rendered = command.render(&self.program.to_string_lossy());

        if self.dry_run && command.is_mutating() {
            println!("{rendered}");
            return Ok(RunOutput::default());
        }

        log::debug!("Running: {rendered}");
        let output = match self.executor.execute(&self.program, command.args()) {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound || !self.is_installed() => {
                return Err(Error::ToolNotInstalled);
            }
            Err(e) => return Err(e.into()),
        };

        let stdout = String::from_utf8(output.stdout)?;
        let stderr = String::from_utf8(output.stderr)?;
        if stderr.is_empty() {
            return Ok(RunOutput {
                stdout,
                warning: None,
            });
        }

        if stderr.contains(&self.not_found_marker()) {
            return Err(Error::ToolNotInstalled);
        }

        if let Some(path) = retry_path.filter(|_| retry && self.repair) {
            if stderr.starts_with(BAD_DIRECTORY_WARNING) {
                log::warn!("Repairing damaged EXIF directory in {}", path.display());
                // The repair always warns; whatever it reports is irrelevant
                // as long as the retry succeeds.
                if let Err(e) = self.run_once(&ExifCommand::repair(path), None, false) {
                    log::debug!("Repair of {} reported: {e}", path.display());
                }
                return self.run_once(command, retry_path, false);
            }
        }

        if stderr.starts_with(WARNING_PREFIX) {
            let warning = stderr.trim_end().to_string();
            log::warn!("{warning}");
            return Ok(RunOutput {
                stdout,
                warning: Some(warning),
            });
        }

        Err(Error::ToolInvocationFailed {
            command: rendered,
            stderr,
        })
    }

    fn not_found_marker(&self) -> String {
        let name = Path::new(&self.program)
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy();
        format!("{name}: command not found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;

    fn tool(executor: ScriptedExecutor) -> ExifTool<ScriptedExecutor> {
        ExifTool::with_executor(executor)
    }

    fn read_cmd() -> ExifCommand {
        ExifCommand::read()
            .json_output()
            .file(Path::new("photo.jpg"))
    }

    #[test]
    fn clean_run_returns_stdout() {
        let t = tool(ScriptedExecutor::new().respond("[{}]", ""));
        let out = t.run(&read_cmd(), None).unwrap();
        assert_eq!(out.stdout, "[{}]");
        assert!(out.warning.is_none());
        assert_eq!(t.executor().calls().len(), 1);
    }

    #[test]
    fn damaged_directory_is_repaired_then_retried() {
        let t = tool(
            ScriptedExecutor::new()
                .respond("", "Warning: Bad ExifIFD directory blah")
                .respond("", "Warning: [minor] rebuilt")
                .respond("ok", ""),
        );
        let cmd = read_cmd();
        let out = t.run(&cmd, Some(Path::new("photo.jpg"))).unwrap();
        assert_eq!(out.stdout, "ok");

        let calls = t.executor().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], calls[2]);
        assert_eq!(
            calls[1],
            [
                "-overwrite_original_in_place",
                "-all=",
                "-tagsfromfile",
                "@",
                "-all:all",
                "-unsafe",
                "photo.jpg"
            ]
        );
    }

    #[test]
    fn retry_is_single_shot() {
        let t = tool(
            ScriptedExecutor::new()
                .respond("", "Warning: Bad ExifIFD directory")
                .respond("", "Error: cannot repair")
                .respond("still", "Warning: Bad ExifIFD directory"),
        );
        let out = t.run(&read_cmd(), Some(Path::new("photo.jpg"))).unwrap();
        assert_eq!(out.stdout, "still");
        assert_eq!(
            out.warning.as_deref(),
            Some("Warning: Bad ExifIFD directory")
        );
        assert_eq!(t.executor().calls().len(), 3);
    }

    #[test]
    fn damaged_directory_without_path_is_a_plain_warning() {
        let t = tool(ScriptedExecutor::new().respond("out", "Warning: Bad ExifIFD directory"));
        let out = t.run(&read_cmd(), None).unwrap();
        assert_eq!(out.stdout, "out");
        assert_eq!(t.executor().calls().len(), 1);
    }

    #[test]
    fn repair_can_be_disabled() {
        let t = tool(ScriptedExecutor::new().respond("out", "Warning: Bad ExifIFD directory"))
            .repair_damaged_directories(false);
        t.run(&read_cmd(), Some(Path::new("photo.jpg"))).unwrap();
        assert_eq!(t.executor().calls().len(), 1);
    }

    #[test]
    fn command_not_found_reports_install_info() {
        let t = tool(ScriptedExecutor::new().respond("", "sh: exiftool: command not found"));
        let err = t.run(&read_cmd(), Some(Path::new("photo.jpg"))).unwrap_err();
        assert!(matches!(err, Error::ToolNotInstalled));
        assert!(err.to_string().contains("https://exiftool.org"));
    }

    #[test]
    fn custom_program_name_is_used_for_not_found() {
        let t = tool(
            ScriptedExecutor::new().respond("", "image-exiftool: command not found"),
        )
        .program("/opt/bin/image-exiftool");
        assert!(matches!(
            t.run(&read_cmd(), None),
            Err(Error::ToolNotInstalled)
        ));
    }

    #[test]
    fn missing_binary_is_not_installed() {
        let t = tool(ScriptedExecutor::new().fail(io::ErrorKind::NotFound));
        assert!(matches!(
            t.run(&read_cmd(), None),
            Err(Error::ToolNotInstalled)
        ));
    }

    #[test]
    fn spawn_failure_checks_for_the_tool() {
        let t = tool(
            ScriptedExecutor::new()
                .fail(io::ErrorKind::PermissionDenied)
                .respond("12.76\n", ""),
        );
        assert!(matches!(t.run(&read_cmd(), None), Err(Error::Io(_))));
        assert_eq!(t.executor().calls()[1], ["-ver"]);

        let t = tool(
            ScriptedExecutor::new()
                .fail(io::ErrorKind::PermissionDenied)
                .fail(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(
            t.run(&read_cmd(), None),
            Err(Error::ToolNotInstalled)
        ));
    }

    #[test]
    fn installed_check_runs_once() {
        let t = tool(ScriptedExecutor::new().respond("12.76\n", ""));
        assert!(t.is_installed());
        assert!(t.is_installed());
        assert_eq!(t.executor().calls().len(), 1);
    }

    #[test]
    fn benign_warning_is_cleared() {
        let t = tool(ScriptedExecutor::new().respond("1 image files updated\n", "Warning: odd\n"));
        let out = t.run(&read_cmd(), Some(Path::new("photo.jpg"))).unwrap();
        assert_eq!(out.stdout, "1 image files updated\n");
        assert_eq!(out.warning.as_deref(), Some("Warning: odd"));
    }

    #[test]
    fn other_stderr_is_fatal() {
        let t = tool(ScriptedExecutor::new().respond("", "Error: File not found - photo.jpg\n"));
        match t.run(&read_cmd(), Some(Path::new("photo.jpg"))) {
            Err(Error::ToolInvocationFailed { command, stderr }) => {
                assert_eq!(stderr, "Error: File not found - photo.jpg\n");
                assert!(command.starts_with("exiftool -j"));
            }
            other => panic!("expected ToolInvocationFailed, got {other:?}"),
        }
    }

    #[test]
    fn dry_run_skips_mutating_commands_only() {
        let t = tool(ScriptedExecutor::new().respond("[{}]", "")).dry_run(true);
        let write = ExifCommand::write()
            .assign("Title", "x")
            .file(Path::new("photo.jpg"));
        assert_eq!(t.run(&write, None).unwrap(), RunOutput::default());
        assert!(t.executor().calls().is_empty());

        t.run(&read_cmd(), None).unwrap();
        assert_eq!(t.executor().calls().len(), 1);
    }
}
