//! multicode CLI entry point

use clap::Parser;
use multicode::config::{Cli, Settings};
use multicode::encoder::ProfileRegistry;
use multicode::pipeline::{self, RunSummary};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    let registry = ProfileRegistry::builtin();
    if cli.list_profiles {
        print_profiles(&registry);
        return ExitCode::SUCCESS;
    }

    // Initialize logging
    init_logging(&cli);

    // Build and validate settings from CLI
    let settings = match Settings::from_cli(&cli, &registry) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if !cli.quiet {
        print_plan_header(&settings);
    }

    // Run the pipeline
    match pipeline::run(&settings, &settings.toolbox()) {
        Ok(summary) => {
            print_summary(&summary);
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_profiles(registry: &ProfileRegistry) {
    println!("Available encoder settings:");
    for profile in registry.iter() {
        println!(
            "  {:<14} {:<13} .{:<5} {}",
            profile.name,
            profile.folder,
            profile.extension(),
            profile.options.join(" ")
        );
    }
}

fn print_plan_header(settings: &Settings) {
    let names: Vec<_> = settings.profiles.iter().map(|p| p.name).collect();
    println!("Encoder settings: {}", names.join(", "));
    println!("Input folders:");
    for input in &settings.inputs {
        println!("  {}", input.display());
    }
    println!("Output folder: {}", settings.output.display());
}

fn print_summary(summary: &RunSummary) {
    if summary.dry_run {
        return;
    }

    if !summary.unclassified.is_empty() {
        println!();
        println!("Skipped {} unrecognized files:", summary.unclassified.len());
        for path in &summary.unclassified {
            println!("  {}", path.display());
        }
    }

    if !summary.failures.is_empty() {
        println!();
        println!("Failed to encode the following {} files:", summary.failed());
        for failure in &summary.failures {
            println!("  {}", failure.path().display());
            println!("    {}", failure.error);
        }
    }

    println!();
    println!("{}", summary.completion_line());
}
