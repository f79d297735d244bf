//! Process invocation with a timeout hook

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::warn;

/// How often a running child is polled while a timeout is armed
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Longest stderr excerpt carried in a failure reason
const STDERR_EXCERPT_CHARS: usize = 400;

/// Errors raised while running an external program
#[derive(Debug, Error)]
pub enum ToolError {
    /// Program binary not found.
    #[error("{} not found (is it installed and on PATH?)", program.display())]
    NotFound { program: PathBuf },

    /// Program could not be started.
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Program ran past the configured limit and was killed.
    #[error("{} timed out after {timeout:?}", program.display())]
    Timeout { program: PathBuf, timeout: Duration },

    /// I/O error while waiting on the program.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One external program call: the program and its argv, no shell involved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// File the program is expected to produce, if any
    pub creates: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            creates: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Declare the output file; a successful exit without it counts as failure
    pub fn creates(mut self, path: impl Into<PathBuf>) -> Self {
        self.creates = Some(path.into());
        self
    }

    /// File name of the program, e.g. `flac` for `/usr/bin/flac`
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// Whether any argument equals `value`
    pub fn has_arg(&self, value: impl AsRef<OsStr>) -> bool {
        let value = value.as_ref();
        self.args.iter().any(|a| a == value)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {:?}", arg)?;
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Successful exit with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed exit with the given code and stderr
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human description of a failed exit, with an excerpt of stderr
    pub fn failure_reason(&self, program: &Path) -> String {
        let status = match self.code {
            Some(code) => format!("{} exited with code {}", program.display(), code),
            None => format!("{} was terminated by a signal", program.display()),
        };
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            status
        } else {
            let excerpt: String = stderr.chars().take(STDERR_EXCERPT_CHARS).collect();
            format!("{}: {}", status, excerpt)
        }
    }

    fn from_status(status: ExitStatus, stdout: String, stderr: String) -> Self {
        Self {
            code: status.code(),
            stdout,
            stderr,
        }
    }
}

/// Runs external programs
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion and report its exit status and output
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError>;

    /// Get the name of this runner (for logging)
    fn name(&self) -> &'static str;
}

/// Runs programs as child processes of this one
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// A runner that waits for as long as each program takes
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any program still running after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn wait_with_timeout(
        child: &mut Child,
        program: &Path,
        limit: Duration,
    ) -> Result<ExitStatus, ToolError> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= limit {
                if let Err(e) = child.kill() {
                    warn!("Could not kill {}: {}", program.display(), e);
                }
                // Reap the child so it does not linger as a zombie
                let _ = child.wait();
                return Err(ToolError::Timeout {
                    program: program.to_path_buf(),
                    timeout: limit,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        let program = &invocation.program;
        let mut child = Command::new(program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ToolError::NotFound {
                        program: program.clone(),
                    }
                } else {
                    ToolError::Spawn {
                        program: program.clone(),
                        source: e,
                    }
                }
            })?;

        // Drain both pipes concurrently so a chatty program cannot fill one and stall
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = match self.timeout {
            Some(limit) => Self::wait_with_timeout(&mut child, program, limit)?,
            None => child.wait()?,
        };

        Ok(ToolOutput::from_status(
            status,
            join_reader(stdout),
            join_reader(stderr),
        ))
    }

    fn name(&self) -> &'static str {
        "system"
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("/usr/bin/flac")
            .arg("--silent")
            .args(["-o", "/tmp/out.flac"])
            .creates("/tmp/out.flac");
        assert_eq!(inv.program_name(), "flac");
        assert_eq!(inv.args.len(), 3);
        assert!(inv.has_arg("-o"));
        assert!(!inv.has_arg("-T"));
        assert_eq!(inv.creates, Some(PathBuf::from("/tmp/out.flac")));
    }

    #[test]
    fn test_arguments_are_not_shell_split() {
        let inv = Invocation::new("lame").arg("Artist \"Quoted\" & Co; rm -rf /");
        assert_eq!(inv.args.len(), 1);
    }

    #[test]
    fn test_failure_reason_includes_stderr() {
        let output = ToolOutput::failure(3, "bad header\n");
        let reason = output.failure_reason(Path::new("flac"));
        assert_eq!(reason, "flac exited with code 3: bad header");
        assert!(!output.is_success());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_stdout() {
        let runner = SystemRunner::new();
        let output = runner
            .run(&Invocation::new("sh").args(["-c", "echo ARTIST=A"]))
            .unwrap();
        assert!(output.is_success());
        assert_eq!(output.stdout.trim(), "ARTIST=A");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_code() {
        let runner = SystemRunner::new();
        let output = runner
            .run(&Invocation::new("sh").args(["-c", "echo oops >&2; exit 4"]))
            .unwrap();
        assert_eq!(output.code, Some(4));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_missing_binary() {
        let runner = SystemRunner::new();
        let result = runner.run(&Invocation::new("/nonexistent/multicode-tool"));
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_kills_on_timeout() {
        let runner = SystemRunner::new().with_timeout(Duration::from_millis(100));
        let start = Instant::now();
        let result = runner.run(&Invocation::new("sleep").arg("5"));
        assert!(matches!(result, Err(ToolError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_within_timeout() {
        let runner = SystemRunner::new().with_timeout(Duration::from_secs(10));
        let output = runner.run(&Invocation::new("true")).unwrap();
        assert!(output.is_success());
    }
}
