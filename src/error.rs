//! Unified error types for multicode
//!
//! Error strategy:
//! - Per-entry errors (classification, decode, directory creation, encode):
//!   recorded against the entry, the rest of the batch continues
//! - Configuration errors: fatal at startup, before any work begins
//!
//! Cleanup of temporary artifacts never produces an error of its own.

use std::path::PathBuf;
use thiserror::Error;

/// Supported input extensions for helpful error messages
pub const SUPPORTED_EXTENSIONS: &str = "aif, aiff, flac, m4a, mp3, mp4, ogg, wav";

/// Top-level error type for multicode operations
#[derive(Debug, Error)]
pub enum MulticodeError {
    // =========================================================================
    // Per-entry errors - record the entry, continue the batch
    // =========================================================================
    #[error("Not a recognized audio file: '{path}'\n  Supported extensions: {SUPPORTED_EXTENSIONS}")]
    Unclassified { path: PathBuf },

    #[error("Failed to decode '{path}': {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    #[error("Could not make directories for '{path}': {reason}")]
    DirectoryCreation { path: PathBuf, reason: String },

    #[error("Encoding '{path}' with {profile} failed: {reason}")]
    EncodeFailed {
        profile: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Processing '{path}' panicked: {message}")]
    WorkerPanic { path: PathBuf, message: String },

    // =========================================================================
    // Configuration errors - fatal, reported as usage errors
    // =========================================================================
    #[error("Encoder setting \"{0}\" does not exist\n  Tip: run with --list-profiles to see the available settings")]
    UnknownProfile(String),

    #[error("Encoder setting \"{0}\" was specified more than once")]
    DuplicateProfile(String),

    #[error("You must specify at least one encoder setting (-s)")]
    NoProfiles,

    #[error("You must specify at least one input folder (-i)")]
    NoInputs,

    #[error("Not a directory: '{0}'")]
    NotADirectory(PathBuf),

    #[error("You must specify exactly one output directory (got {0})")]
    OutputDirectoryCount(usize),

    // =========================================================================
    // Fatal runtime errors
    // =========================================================================
    #[error("Cannot write report to '{path}': {reason}\n  Tip: Check write permissions for the report location")]
    ReportError { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for multicode operations
pub type Result<T> = std::result::Result<T, MulticodeError>;

impl MulticodeError {
    /// Returns true if this error is isolated to a single file (skip it, continue the batch)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MulticodeError::Unclassified { .. }
                | MulticodeError::DecodeFailed { .. }
                | MulticodeError::DirectoryCreation { .. }
                | MulticodeError::EncodeFailed { .. }
                | MulticodeError::WorkerPanic { .. }
        )
    }

    /// Returns true if this error comes from invalid command-line input
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            MulticodeError::UnknownProfile(_)
                | MulticodeError::DuplicateProfile(_)
                | MulticodeError::NoProfiles
                | MulticodeError::NoInputs
                | MulticodeError::NotADirectory(_)
                | MulticodeError::OutputDirectoryCount(_)
        )
    }

    /// Process exit code for this error when it ends the run
    pub fn exit_code(&self) -> u8 {
        if self.is_usage_error() {
            2
        } else {
            1
        }
    }

    /// Create a decode error with context about the issue
    pub fn decode_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MulticodeError::DecodeFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an encode error for a profile
    pub fn encode_failed(
        profile: impl Into<String>,
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        MulticodeError::EncodeFailed {
            profile: profile.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a directory creation error, describing common causes
    pub fn directory_creation(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::AlreadyExists => {
                "A file with that name already exists".to_string()
            }
            _ => err.to_string(),
        };
        MulticodeError::DirectoryCreation { path, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_errors_are_recoverable() {
        assert!(MulticodeError::decode_failed("/a.flac", "exit 1").is_recoverable());
        assert!(MulticodeError::encode_failed("flac", "/a", "exit 1").is_recoverable());
        assert!(!MulticodeError::NoProfiles.is_recoverable());
    }

    #[test]
    fn test_usage_errors_exit_with_two() {
        assert_eq!(MulticodeError::UnknownProfile("x".into()).exit_code(), 2);
        assert_eq!(MulticodeError::OutputDirectoryCount(2).exit_code(), 2);
        let io = MulticodeError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn test_directory_creation_permission_message() {
        let err = MulticodeError::directory_creation(
            "/root/out",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("Permission denied"));
    }
}
