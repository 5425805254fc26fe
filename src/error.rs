use thiserror::Error;

/// Installation guidance returned when `exiftool` cannot be started.
pub const INSTALL_EXIFTOOL_INFO: &str = "
Cannot find 'exiftool'.

The ExifEditor requires that the 'exiftool' command-line
utility is installed in order to work. Information on obtaining
this excellent utility can be found at:

https://exiftool.org
";

/// Errors produced by the runner and the editor.
#[derive(Debug, Error)]
pub enum Error {
    /// `exiftool` is absent or cannot be reached.
    #[error("{INSTALL_EXIFTOOL_INFO}")]
    ToolNotInstalled,

    /// `exiftool` wrote something to stderr that is neither a benign warning
    /// nor a recoverable directory problem.
    #[error("exiftool failed: {stderr}")]
    ToolInvocationFailed { command: String, stderr: String },

    /// Misuse detected before any process was spawned.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `exiftool` answered, but not in the shape we expect.
    #[error("Unexpected exiftool output: {0}")]
    UnexpectedOutput(String),

    #[error("Failed to parse exiftool JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("exiftool output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
