//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// multicode - batch audio transcoder
///
/// Converts every audio file under the input folders into each selected
/// encoder setting, preserving tags and folder layout. Output lands in
/// OUTPUT/<setting folder>/<input folder name>/...
#[derive(Parser, Debug)]
#[command(name = "multicode")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Encoder setting to produce (repeatable, see --list-profiles)
    #[arg(short = 's', long = "setting", value_name = "NAME")]
    pub settings: Vec<String>,

    /// Input folder (repeatable)
    #[arg(short = 'i', long = "input", value_name = "DIR")]
    pub inputs: Vec<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    pub outputs: Vec<PathBuf>,

    /// Number of worker threads (defaults to the number of processors)
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Seconds before a codec program is killed (0 waits forever)
    #[arg(long, value_name = "SECS", default_value_t = 3600)]
    pub timeout: u64,

    /// Directory containing the codec programs (defaults to PATH lookup)
    #[arg(long, value_name = "DIR", env = "MULTICODE_TOOL_DIR")]
    pub tool_dir: Option<PathBuf>,

    /// Directory for temporary decoded files
    #[arg(long, value_name = "DIR", env = "MULTICODE_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Dry run - show the planned encodes without running them
    #[arg(long, default_value = "false")]
    pub dry_run: bool,

    /// List the available encoder settings and exit
    #[arg(long, default_value = "false")]
    pub list_profiles: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars and most logging)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Get the log filter based on verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
