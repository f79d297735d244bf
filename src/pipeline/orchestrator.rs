//! Pipeline orchestration
//!
//! Scans the inputs, builds the work queue, runs the worker pool and writes
//! the optional report.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, info};

use super::queue::{build_queue, WorkQueue};
use super::report::RunSummary;
use super::worker::WorkerPool;
use crate::config::Settings;
use crate::discovery;
use crate::error::{MulticodeError, Result};
use crate::export;
use crate::tools::Toolbox;

/// Run the full transcoding pipeline
///
/// Per-entry failures are returned in the summary; only setup problems
/// (unreadable inputs, an unwritable output or report) are errors.
pub fn run(settings: &Settings, tools: &Toolbox) -> Result<RunSummary> {
    let start = Instant::now();
    let profile_names: Vec<String> = settings.profiles.iter().map(|p| p.name.to_string()).collect();

    info!("Encoder settings: {}", profile_names.join(", "));
    for input in &settings.inputs {
        info!("Input folder: {}", input.display());
    }
    info!("Output folder: {}", settings.output.display());
    debug!("Tools: {:?}", tools);

    // Phase 1: Discovery
    let file_lists = settings
        .inputs
        .iter()
        .map(|input| discovery::scan(input))
        .collect::<Result<Vec<_>>>()?;

    // Phase 2: Work-item building
    let queue = build_queue(&file_lists, &settings.profiles, &settings.output, tools);

    let mut summary = RunSummary {
        total: queue.len(),
        profiles: profile_names,
        dry_run: settings.dry_run,
        ..Default::default()
    };

    if settings.dry_run {
        print_plan(&queue);
        summary.unclassified = queue.unclassified;
        summary.elapsed = start.elapsed();
        return Ok(summary);
    }

    if queue.is_empty() {
        info!("No audio files found");
    } else {
        // Phase 3: Encoding
        std::fs::create_dir_all(&settings.output)
            .map_err(|e| MulticodeError::directory_creation(&settings.output, e))?;
        std::fs::create_dir_all(tools.temp_dir())
            .map_err(|e| MulticodeError::directory_creation(tools.temp_dir(), e))?;

        let pool = WorkerPool::new(settings.jobs);
        info!(
            "Encoding {} files with {} workers",
            queue.len(),
            pool.size()
        );

        let progress_bar = if settings.show_progress {
            let pb = ProgressBar::new(queue.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        summary.failures = pool.run(queue.entries, tools, progress_bar);
    }

    summary.unclassified = queue.unclassified;
    summary.elapsed = start.elapsed();

    info!("{}", summary.completion_line());

    if let Some(report) = &settings.report {
        export::write_report(&summary, report)?;
    }

    Ok(summary)
}

/// Dry run mode - show the planned encodes without running any
fn print_plan(queue: &WorkQueue) {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    for entry in &queue.entries {
        println!("[{:>6}] {}", entry.number, entry.input.path().display());
        for target in &entry.targets {
            println!("         {:<14} -> {}", target.profile.name, target.output_file().display());
        }
    }

    println!();
    println!(
        "Would encode {} files to {} outputs",
        queue.len(),
        queue.target_count()
    );
    if !queue.unclassified.is_empty() {
        println!("{} files are not recognized and would be skipped", queue.unclassified.len());
    }
    println!();
}
