//! Report acquisition — trait + system process backend.

use std::fmt;
use std::path::PathBuf;

/// Command line that produces the peripheral power report.
pub const REPORT_COMMAND: &[&str] = &["upower", "-d"];

/// Owned copy of [`REPORT_COMMAND`] for callers that hold the argv.
pub fn default_command() -> Vec<String> {
    REPORT_COMMAND.iter().map(|s| s.to_string()).collect()
}

/// Report acquisition errors.
///
/// `command` is the full argv rendered as one line, so log output shows
/// exactly what was attempted.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The process could not be started at all.
    Spawn { command: String, message: String },
    /// The process ran but exited unsuccessfully.
    Failed {
        command: String,
        /// Exit code, or `None` when terminated by a signal.
        status: Option<i32>,
        stderr: String,
    },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Spawn { command, message } => {
                write!(f, "failed to run {command}: {message}")
            }
            FetchError::Failed {
                command,
                status,
                stderr,
            } => {
                match status {
                    Some(code) => write!(f, "{command} exited with status {code}")?,
                    None => write!(f, "{command} terminated by signal")?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for FetchError {}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Anything that can produce report text for a given argv.
pub trait CommandRunner {
    /// Run `argv` and return its stdout as UTF-8 text.
    fn run(&self, argv: &[String]) -> Result<String>;
}

/// Real backend: spawns the process and captures its output.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<String> {
        let command = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(FetchError::Spawn {
                command,
                message: "empty command line".into(),
            });
        };
        let output = std::process::Command::new(program)
            .args(args)
            .output()
            .map_err(|e| FetchError::Spawn {
                command: command.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(FetchError::Failed {
                command,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Backend that reads a saved report from a file instead of spawning
/// anything. Lets the CLI replay captured output.
pub struct FileRunner {
    path: PathBuf,
}

impl FileRunner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileRunner { path: path.into() }
    }
}

impl CommandRunner for FileRunner {
    fn run(&self, _argv: &[String]) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| FetchError::Spawn {
            command: format!("read {}", self.path.display()),
            message: e.to_string(),
        })
    }
}

/// Scripted runner for tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Queue of canned responses; each `run` pops the front and records the
    /// argv. An empty queue yields `Ok("")`.
    pub struct MockRunner {
        pub responses: RefCell<VecDeque<Result<String>>>,
        /// Recorded argv of every call.
        pub calls: RefCell<Vec<Vec<String>>>,
    }

    impl MockRunner {
        pub fn new() -> Self {
            MockRunner {
                responses: RefCell::new(VecDeque::new()),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn push_output(&self, output: &str) {
            self.responses.borrow_mut().push_back(Ok(output.to_string()));
        }

        pub fn push_failure(&self, error: FetchError) {
            self.responses.borrow_mut().push_back(Err(error));
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Default for MockRunner {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CommandRunner for MockRunner {
        fn run(&self, argv: &[String]) -> Result<String> {
            self.calls.borrow_mut().push(argv.to_vec());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}
