/*!
 * Command-line interface for repotxt
 */

use std::io;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use repotxt::analyzer::{Analyzer, Stage};
use repotxt::config::{Args, Config};
use repotxt::git::{Git2Provider, GitProgress};
use repotxt::logging::init_tracing;
use repotxt::report::{Reporter, ScanReport};

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "repotxt", &mut io::stdout());
        return Ok(());
    }

    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let config = Config::from_args(args)?;
    config.validate()?;

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {elapsed_precise}")
            .context("invalid progress template")?,
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_prefix("repotxt");

    let clone_bar = progress.clone();
    let provider = Git2Provider::new().with_progress(move |p: &GitProgress| {
        clone_bar.set_message(format!(
            "Cloning repository: {}% ({}/{} objects, {})",
            p.percentage(),
            p.received_objects,
            p.total_objects,
            p.formatted_bytes()
        ));
    });

    let stage_bar = progress.clone();
    let analyzer = Analyzer::new(provider)
        .with_model(config.model)
        .with_observer(move |stage: Stage| stage_bar.set_message(stage.to_string()));

    let start_time = Instant::now();
    let outcome = analyzer.run_with_stats(&config.request);
    progress.finish_and_clear();
    let (result, stats) = outcome?;

    println!(
        "Analysis complete. Output saved to {}",
        result.output_file.display()
    );
    println!("Token count: {}", result.token_count);

    let report = ScanReport::new(
        &result,
        &stats,
        analyzer.context_window(),
        start_time.elapsed(),
    );
    Reporter::new().print_report(&report);

    Ok(())
}
