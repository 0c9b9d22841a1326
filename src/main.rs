//! thumb-warmer - Bulk Thumbnail Cache Warmer
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thumb_warmer::config::{CliArgs, WarmConfig};
use thumb_warmer::progress::{print_header, print_summary, Progress, ProgressReporter};
use thumb_warmer::runner::{warm_single, WarmRunner};
use thumb_warmer::ReadaheadCache;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = WarmConfig::from_args(args).context("Invalid configuration")?;
    let cache = Arc::new(ReadaheadCache::new());

    // Fast path: a single file argument warms just that file and skips the
    // walker and the worker pool entirely.
    if config.root.is_file() {
        warm_single(cache.as_ref(), &config.root).context("Failed to warm file")?;
        info!(path = %config.root.display(), "Thumbnail warmed");
        if config.show_progress {
            println!("Warmed {}", config.root.display());
        }
        return Ok(());
    }

    if config.show_progress {
        print_header(
            &config.root.display().to_string(),
            config.worker_count,
            config.recursive,
        );
    }

    let show_progress = config.show_progress;
    let runner = WarmRunner::new(config, cache, Arc::new(Progress::new()));
    let progress = runner.progress();

    // Ctrl-C requests cooperative cancellation; the run stops within one
    // in-flight item per worker.
    let cancel_handle = runner.progress();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, canceling...");
        cancel_handle.request_cancel();
    })
    .context("Failed to set signal handler")?;

    // Reporter polls the shared progress object until a terminal state.
    let reporter_handle = show_progress.then(|| {
        let progress = Arc::clone(&progress);
        thread::spawn(move || {
            let reporter = ProgressReporter::new();
            loop {
                let snapshot = progress.snapshot();
                reporter.update(&snapshot);
                if snapshot.state.is_terminal() {
                    break;
                }
                thread::sleep(Duration::from_millis(100));
            }
            reporter.finish("");
        })
    });

    let result = runner.run();

    // On a failed run the state may never turn terminal; force it so the
    // reporter thread can exit before the error propagates.
    if result.is_err() {
        progress.request_cancel();
    }
    if let Some(handle) = reporter_handle {
        let _ = handle.join();
    }

    let summary = result.context("Warm-up failed")?;

    print_summary(
        summary.state,
        summary.processed,
        summary.total,
        summary.duration,
    );

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("thumb_warmer=debug,warn")
    } else {
        EnvFilter::new("thumb_warmer=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
