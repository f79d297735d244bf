//! Testing utilities: a scripted stand-in for the external codec tools.
//!
//! # Example
//!
//! ```
//! use multicode::testing::MockToolRunner;
//! use multicode::tools::{Invocation, ToolRunner};
//!
//! let runner = MockToolRunner::new();
//! runner.set_tag_output("/music/track.flac", "ARTIST=A\nTITLE=T\n");
//! runner.fail_on("lame", "track");
//!
//! let output = runner
//!     .run(&Invocation::new("metaflac").arg("--export-tags-to=-").arg("/music/track.flac"))
//!     .unwrap();
//! assert!(output.stdout.contains("ARTIST=A"));
//! assert_eq!(runner.calls_to("metaflac"), 1);
//! ```

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::tools::{Invocation, ToolError, ToolOutput, ToolRunner};

/// Bytes written to every file a successful mock tool "produces"
pub const MOCK_AUDIO: &[u8] = b"mock audio";

/// Bytes left behind by a failing mock tool
pub const MOCK_PARTIAL: &[u8] = b"partial";

/// Limit reported by timed-out mock calls
pub const MOCK_TIMEOUT: Duration = Duration::from_secs(3600);

/// What a matching rule does to the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Exit with code 1, leaving a partial output
    Fail,
    /// Report that the program ran past its time limit
    Timeout,
    /// Panic inside the runner
    Panic,
}

#[derive(Debug, Clone)]
struct FailRule {
    outcome: Outcome,
    program: String,
    arg_contains: Option<String>,
}

impl FailRule {
    fn matches(&self, invocation: &Invocation) -> bool {
        if invocation.program_name() != self.program {
            return false;
        }
        match &self.arg_contains {
            None => true,
            Some(needle) => invocation
                .args
                .iter()
                .any(|a| a.to_string_lossy().contains(needle.as_str())),
        }
    }
}

/// Mock implementation of the ToolRunner trait.
///
/// Provides controllable behavior for testing:
/// - Every invocation is recorded for assertions
/// - Successful calls write [`MOCK_AUDIO`] to the declared output file
/// - Tag readers return scripted stdout for the file they are asked about
/// - Configured program/argument matches fail with exit code 1, leaving a
///   partial output file behind
/// - Timeout and panic rules stand in for hung or crashing tools
#[derive(Debug, Default)]
pub struct MockToolRunner {
    invocations: Mutex<Vec<Invocation>>,
    failures: Mutex<Vec<FailRule>>,
    tag_output: Mutex<HashMap<OsString, String>>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockToolRunner {
    /// Create a new mock runner where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    fn add_rule(&self, outcome: Outcome, program: &str, needle: Option<&str>) {
        locked(&self.failures).push(FailRule {
            outcome,
            program: program.to_string(),
            arg_contains: needle.map(str::to_string),
        });
    }

    /// Make every call to `program` fail.
    pub fn fail(&self, program: &str) {
        self.add_rule(Outcome::Fail, program, None);
    }

    /// Make calls to `program` fail when any argument contains `needle`.
    pub fn fail_on(&self, program: &str, needle: &str) {
        self.add_rule(Outcome::Fail, program, Some(needle));
    }

    /// Make calls to `program` time out when any argument contains `needle`.
    pub fn time_out_on(&self, program: &str, needle: &str) {
        self.add_rule(Outcome::Timeout, program, Some(needle));
    }

    /// Make calls to `program` panic when any argument contains `needle`.
    pub fn panic_on(&self, program: &str, needle: &str) {
        self.add_rule(Outcome::Panic, program, Some(needle));
    }

    /// Stdout returned by tag-reading calls about `path`.
    pub fn set_tag_output(&self, path: impl AsRef<Path>, stdout: &str) {
        locked(&self.tag_output).insert(
            path.as_ref().as_os_str().to_os_string(),
            stdout.to_string(),
        );
    }

    /// All recorded invocations, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        locked(&self.invocations).clone()
    }

    /// Recorded invocations of one program.
    pub fn invocations_of(&self, program: &str) -> Vec<Invocation> {
        locked(&self.invocations)
            .iter()
            .filter(|inv| inv.program_name() == program)
            .cloned()
            .collect()
    }

    /// Number of calls made to `program`.
    pub fn calls_to(&self, program: &str) -> usize {
        self.invocations_of(program).len()
    }

    fn stdout_for(&self, invocation: &Invocation) -> String {
        let tag_output = locked(&self.tag_output);
        invocation
            .args
            .iter()
            .find_map(|arg| tag_output.get(arg))
            .cloned()
            .unwrap_or_default()
    }
}

impl ToolRunner for MockToolRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        locked(&self.invocations).push(invocation.clone());

        let outcome = locked(&self.failures)
            .iter()
            .find(|rule| rule.matches(invocation))
            .map(|rule| rule.outcome);

        match outcome {
            Some(Outcome::Fail) => {
                if let Some(output) = &invocation.creates {
                    let _ = std::fs::write(output, MOCK_PARTIAL);
                }
                return Ok(ToolOutput::failure(1, "mock failure"));
            }
            Some(Outcome::Timeout) => {
                return Err(ToolError::Timeout {
                    program: invocation.program.clone(),
                    timeout: MOCK_TIMEOUT,
                });
            }
            Some(Outcome::Panic) => panic!("mock {} crashed", invocation.program_name()),
            None => {}
        }

        if let Some(output) = &invocation.creates {
            if let Err(e) = std::fs::write(output, MOCK_AUDIO) {
                return Ok(ToolOutput::failure(1, e.to_string()));
            }
        }

        // Tag readers never declare an output file
        let stdout = if invocation.creates.is_none() {
            self.stdout_for(invocation)
        } else {
            String::new()
        };
        Ok(ToolOutput::success(stdout))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
