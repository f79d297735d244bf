//! External codec tools
//!
//! Every decode, encode and tag-reading operation shells out to one of a
//! fixed set of command-line programs. Calls are built as argv arrays and
//! handed to a [`ToolRunner`]; nothing is ever passed through a shell.

mod paths;
mod runner;

pub use paths::ToolPaths;
pub use runner::{Invocation, SystemRunner, ToolError, ToolOutput, ToolRunner};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Prefix for temporary decoded files
const TEMP_PREFIX: &str = "multicode";

/// Everything the audio and encoder layers need to reach the outside world
#[derive(Clone)]
pub struct Toolbox {
    runner: Arc<dyn ToolRunner>,
    paths: ToolPaths,
    temp_dir: PathBuf,
}

impl Toolbox {
    pub fn new(runner: Arc<dyn ToolRunner>, paths: ToolPaths, temp_dir: PathBuf) -> Self {
        Self {
            runner,
            paths,
            temp_dir,
        }
    }

    pub fn paths(&self) -> &ToolPaths {
        &self.paths
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Run an invocation through the configured runner
    pub fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        debug!("> {}", invocation);
        self.runner.run(invocation)
    }

    /// Run an invocation that must succeed, returning a failure reason if not
    ///
    /// A call fails on a runner error, a nonzero exit, or a successful exit
    /// that did not produce the declared output file. On failure the declared
    /// output is deleted so no partial file survives.
    pub fn run_checked(&self, invocation: &Invocation) -> Result<(), String> {
        let reason = match self.run(invocation) {
            Ok(output) if output.is_success() => match &invocation.creates {
                Some(created) if !created.is_file() => format!(
                    "{} exited successfully but did not create {}",
                    invocation.program.display(),
                    created.display()
                ),
                _ => return Ok(()),
            },
            Ok(output) => output.failure_reason(&invocation.program),
            Err(e) => e.to_string(),
        };

        if let Some(created) = &invocation.creates {
            remove_quietly(created);
        }
        Err(reason)
    }

    /// A temporary path that cannot collide across workers or runs
    ///
    /// Uniqueness comes from a random v4 UUID, not the clock.
    pub fn temp_path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.join(format!(
            "{}_{}_{}",
            TEMP_PREFIX,
            uuid::Uuid::new_v4().simple(),
            file_name
        ))
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("runner", &self.runner.name())
            .field("paths", &self.paths)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

/// Delete a file, ignoring failures
///
/// Used for temporaries and partial outputs; a failed cleanup must never
/// replace the error that triggered it.
pub fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Deleted {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!("Could not delete {}: {}", path.display(), e),
    }
}
