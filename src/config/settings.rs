//! Runtime configuration settings

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::cli::Cli;
use crate::discovery::absolute_root;
use crate::encoder::{Profile, ProfileRegistry};
use crate::error::{MulticodeError, Result};
use crate::pipeline::available_workers;
use crate::tools::{SystemRunner, ToolPaths, Toolbox};

/// Default limit on a single codec program call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

/// Validated runtime settings for the transcoding pipeline
#[derive(Debug, Clone)]
pub struct Settings {
    /// Selected profiles, in command-line order
    pub profiles: Vec<Profile>,
    /// Absolute input root directories
    pub inputs: Vec<PathBuf>,
    /// Output directory
    pub output: PathBuf,
    /// Number of worker threads
    pub jobs: usize,
    /// Per-call limit on codec programs, `None` waits forever
    pub timeout: Option<Duration>,
    /// Directory prefix for codec programs
    pub tool_dir: Option<PathBuf>,
    /// Directory for temporary decoded files
    pub temp_dir: PathBuf,
    /// JSON report destination
    pub report: Option<PathBuf>,
    /// Dry run mode - print the plan without encoding
    pub dry_run: bool,
    /// Show progress bars
    pub show_progress: bool,
}

impl Settings {
    /// Settings with defaults for everything but the work itself
    pub fn new(profiles: Vec<Profile>, inputs: Vec<PathBuf>, output: PathBuf) -> Self {
        Self {
            profiles,
            inputs,
            output,
            jobs: available_workers(),
            timeout: Some(DEFAULT_TIMEOUT),
            tool_dir: None,
            temp_dir: std::env::temp_dir(),
            report: None,
            dry_run: false,
            show_progress: false,
        }
    }

    /// Validate CLI arguments against the profile registry
    pub fn from_cli(cli: &Cli, registry: &ProfileRegistry) -> Result<Self> {
        let output = match cli.outputs.as_slice() {
            [output] => output.clone(),
            other => return Err(MulticodeError::OutputDirectoryCount(other.len())),
        };

        let profiles = registry.select(&cli.settings)?;

        if cli.inputs.is_empty() {
            return Err(MulticodeError::NoInputs);
        }
        let mut inputs = Vec::with_capacity(cli.inputs.len());
        for input in &cli.inputs {
            if !input.is_dir() {
                return Err(MulticodeError::NotADirectory(input.clone()));
            }
            inputs.push(absolute_root(input)?);
        }

        let timeout = match cli.timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let jobs = cli.jobs.filter(|&n| n > 0).unwrap_or_else(available_workers);
        debug!("Using {} workers", jobs);

        Ok(Self {
            profiles,
            inputs,
            output,
            jobs,
            timeout,
            tool_dir: cli.tool_dir.clone(),
            temp_dir: cli.temp_dir.clone().unwrap_or_else(std::env::temp_dir),
            report: cli.report.clone(),
            dry_run: cli.dry_run,
            show_progress: !cli.quiet,
        })
    }

    /// Tool paths honoring `tool_dir`
    pub fn tool_paths(&self) -> ToolPaths {
        match &self.tool_dir {
            Some(dir) => ToolPaths::with_prefix(dir),
            None => ToolPaths::default(),
        }
    }

    /// The production toolbox: real child processes with the configured timeout
    pub fn toolbox(&self) -> Toolbox {
        let runner = match self.timeout {
            Some(limit) => SystemRunner::new().with_timeout(limit),
            None => SystemRunner::new(),
        };
        Toolbox::new(Arc::new(runner), self.tool_paths(), self.temp_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Settings> {
        let mut argv = vec!["multicode"];
        argv.extend_from_slice(args);
        Settings::from_cli(&Cli::parse_from(argv), &ProfileRegistry::builtin())
    }

    #[test]
    fn test_valid_arguments() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().to_str().unwrap();
        let settings = parse(&["-s", "flac", "-s", "alac", "-i", input, "-j", "3", "/out"]).unwrap();

        let names: Vec<_> = settings.profiles.iter().map(|p| p.name).collect();
        assert_eq!(names, ["flac", "alac"]);
        assert_eq!(settings.inputs, [dir.path().to_path_buf()]);
        assert_eq!(settings.output, PathBuf::from("/out"));
        assert_eq!(settings.jobs, 3);
        assert_eq!(settings.timeout, Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_output_count_must_be_one() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().to_str().unwrap();
        assert!(matches!(
            parse(&["-s", "flac", "-i", input]),
            Err(MulticodeError::OutputDirectoryCount(0))
        ));
        assert!(matches!(
            parse(&["-s", "flac", "-i", input, "/a", "/b"]),
            Err(MulticodeError::OutputDirectoryCount(2))
        ));
    }

    #[test]
    fn test_configuration_errors() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().to_str().unwrap();
        let missing = dir.path().join("nope");

        assert!(matches!(parse(&["-i", input, "/out"]), Err(MulticodeError::NoProfiles)));
        assert!(matches!(parse(&["-s", "flac", "/out"]), Err(MulticodeError::NoInputs)));
        assert!(matches!(
            parse(&["-s", "wav", "-i", input, "/out"]),
            Err(MulticodeError::UnknownProfile(_))
        ));
        assert!(matches!(
            parse(&["-s", "flac", "-s", "flac", "-i", input, "/out"]),
            Err(MulticodeError::DuplicateProfile(_))
        ));
        assert!(matches!(
            parse(&["-s", "flac", "-i", missing.to_str().unwrap(), "/out"]),
            Err(MulticodeError::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_input_is_not_resolved() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("real_lib")).unwrap();
        let link = dir.path().join("music");
        std::os::unix::fs::symlink(dir.path().join("real_lib"), &link).unwrap();

        let settings = parse(&["-s", "flac", "-i", link.to_str().unwrap(), "/out"]).unwrap();
        assert_eq!(settings.inputs, [link]);
    }

    #[test]
    fn test_zero_timeout_disables_limit() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().to_str().unwrap();
        let settings = parse(&["-s", "flac", "-i", input, "--timeout", "0", "/out"]).unwrap();
        assert_eq!(settings.timeout, None);
    }

    #[test]
    fn test_tool_dir_prefixes_programs() {
        let mut settings = Settings::new(Vec::new(), Vec::new(), PathBuf::from("/out"));
        settings.tool_dir = Some(PathBuf::from("/opt/bin"));
        assert_eq!(settings.tool_paths().flac, PathBuf::from("/opt/bin/flac"));
    }
}
