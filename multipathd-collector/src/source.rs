//! Where raw status reports come from.
//!
//! A [`StatusSource`] hands back the bytes of one `multipathd show maps json`
//! report. Sources are synchronous and keep no state between calls, so every
//! scrape sees a fresh report.

use std::fmt::Debug;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::FetchError;

/// Default program queried for status.
pub const DEFAULT_PROGRAM: &str = "multipathd";

/// Default arguments: `multipathd show maps json`.
pub const DEFAULT_ARGS: &[&str] = &["show", "maps", "json"];

/// Trait for obtaining a raw status report.
///
/// # Example
///
/// ```no_run
/// use multipathd_collector::{CommandSource, StatusSource};
///
/// let source = CommandSource::default();
/// let bytes = source.fetch()?;
/// println!("{} bytes from {}", bytes.len(), source.description());
/// # Ok::<(), multipathd_collector::FetchError>(())
/// ```
pub trait StatusSource: Send + Sync + Debug {
    /// Fetch the current report.
    fn fetch(&self) -> Result<Vec<u8>, FetchError>;

    /// Returns a human-readable description of the source, for logs.
    fn description(&self) -> &str;
}

/// Runs the daemon's status command and captures its standard output.
///
/// With a timeout set, a command still running at the deadline is killed
/// and reaped before `fetch` returns.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    description: String,
    timeout: Option<Duration>,
}

impl CommandSource {
    /// Create a source running `program` with `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let description = std::iter::once(program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            program,
            args,
            description,
            timeout: None,
        }
    }

    /// Kill the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The program being run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The arguments passed to the program.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The deadline for one run, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn_error(&self, source: std::io::Error) -> FetchError {
        FetchError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    /// Wait for the child, killing it at the deadline.
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, FetchError> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|e| self.spawn_error(e));
        };

        match child.wait_timeout(timeout) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                // kill fails only if the child already exited
                let _ = child.kill();
                let _ = child.wait();
                Err(FetchError::Timeout {
                    program: self.program.clone(),
                    timeout,
                })
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(self.spawn_error(e))
            }
        }
    }
}

/// Drain a child pipe to the end.
fn read_pipe(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        // a read error leaves what was read so far
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}

impl Default for CommandSource {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM, DEFAULT_ARGS.iter().copied())
    }
}

impl StatusSource for CommandSource {
    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both pipes are drained while waiting so a large report cannot
        // block the child. Killing the child closes them.
        let (status, stdout, stderr) = thread::scope(|scope| {
            let stdout = scope.spawn(move || read_pipe(stdout));
            let stderr = scope.spawn(move || read_pipe(stderr));
            let status = self.wait(&mut child);
            (
                status,
                stdout.join().unwrap_or_default(),
                stderr.join().unwrap_or_default(),
            )
        });
        let status = status?;

        if !status.success() {
            return Err(FetchError::Exit {
                program: self.program.clone(),
                status,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(stdout)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Reads a saved report from a JSON file.
///
/// Every fetch re-reads the file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusSource for FileSource {
    fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        fs::read(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}
