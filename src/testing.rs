//! Test double for the process layer.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::io;

use crate::exif::{Executor, ProcessOutput};

/// Replays canned exiftool answers in order and records every argument
/// vector it was given. Runs past the end of the script succeed silently.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    responses: RefCell<VecDeque<io::Result<ProcessOutput>>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, stdout: &str, stderr: &str) -> Self {
        self.responses.borrow_mut().push_back(Ok(ProcessOutput {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }));
        self
    }

    /// Answer with a single JSON record, the way `exiftool -j` does.
    pub fn respond_json(self, record: serde_json::Value) -> Self {
        let stdout = serde_json::Value::Array(vec![record]).to_string();
        self.respond(&stdout, "")
    }

    pub fn fail(self, kind: io::ErrorKind) -> Self {
        self.responses.borrow_mut().push_back(Err(kind.into()));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, _program: &OsStr, args: &[OsString]) -> io::Result<ProcessOutput> {
        self.calls.borrow_mut().push(
            args.iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        );
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(ProcessOutput::default()))
    }
}
