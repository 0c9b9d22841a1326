//! Work distribution over the candidate stream
//!
//! Drives cache-population calls over the paths produced by the walker,
//! either on a single worker or across a bounded pool, and moves the shared
//! progress object to a terminal state.
//!
//! Architecture (parallel mode):
//! ```text
//! TreeWalker (producer thread)
//! │
//! └── bounded crossbeam channel
//!     │
//!     ├── Worker 0: recv path → populate (own session) → count
//!     ├── Worker 1: recv path → populate (own session) → count
//!     └── Worker N: recv path → populate (own session) → count
//! ```
//!
//! Resource lifecycle: each worker holds exactly one cache session, acquired
//! lazily on its first item and released when the worker exits, on every
//! path out of the loop. Per-item populate failures are swallowed and still
//! counted; only session acquisition is fatal, and only to that worker.

use crate::cache::{CacheService, CacheSession};
use crate::config::{RunMode, WarmConfig};
use crate::error::{Result, WarmError, WorkerError};
use crate::filter::ExtensionFilter;
use crate::progress::{Progress, RunState};
use crate::walker::TreeWalker;
use crossbeam_channel::{bounded, Receiver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct WarmSummary {
    /// Terminal state the run reached
    pub state: RunState,

    /// Populate attempts completed (successes and failures alike)
    pub processed: u64,

    /// Candidate count, when a counting pass ran
    pub total: Option<u64>,

    /// Wall-clock time for the run
    pub duration: Duration,
}

/// Drives the warm-up run to a terminal state
pub struct WarmRunner {
    config: Arc<WarmConfig>,
    cache: Arc<dyn CacheService>,
    progress: Arc<Progress>,
}

impl WarmRunner {
    pub fn new(config: WarmConfig, cache: Arc<dyn CacheService>, progress: Arc<Progress>) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            progress,
        }
    }

    /// Get the shared progress object (for reporters and signal handlers)
    pub fn progress(&self) -> Arc<Progress> {
        Arc::clone(&self.progress)
    }

    /// Run the warm-up
    ///
    /// Returns once the run reaches a terminal state. The only errors that
    /// surface here are session-acquisition failures (whole run in
    /// sequential mode, all-workers in parallel mode) and thread-spawn
    /// failures; everything else is swallowed per the best-effort policy.
    pub fn run(&self) -> Result<WarmSummary> {
        let start = Instant::now();

        lower_process_priority();

        let filter = ExtensionFilter::load(self.config.extensions_file.as_deref());
        let walker = TreeWalker::new(filter, self.config.recursive)
            .with_excludes(self.config.exclude_patterns.clone());

        info!(
            root = %self.config.root.display(),
            mode = ?self.config.mode,
            workers = self.config.worker_count,
            count_first = self.config.count_first,
            "Starting warm-up"
        );

        // Candidate source: stream straight from the walker, or materialize
        // the list first so the reporter can show determinate progress.
        let candidates: Box<dyn Iterator<Item = PathBuf> + Send> = if self.config.count_first {
            self.progress.begin_scanning();

            let mut list = Vec::new();
            for path in walker.walk(&self.config.root) {
                if self.progress.cancel_requested() {
                    return Ok(self.summarize(start));
                }
                list.push(path);
            }

            self.progress.set_total(list.len() as u64);
            info!(total = list.len(), "Counting pass complete");
            Box::new(list.into_iter())
        } else {
            Box::new(walker.walk(&self.config.root))
        };

        self.progress.begin_processing();

        match self.config.mode {
            RunMode::Sequential => self.run_sequential(candidates)?,
            RunMode::Parallel => self.run_parallel(candidates)?,
        }

        // A canceled run keeps its Canceled state; finish() refuses the CAS.
        self.progress.finish();

        let summary = self.summarize(start);
        info!(
            state = ?summary.state,
            processed = summary.processed,
            duration_secs = summary.duration.as_secs(),
            "Warm-up finished"
        );

        Ok(summary)
    }

    /// Sequential mode: one session for the whole run
    fn run_sequential(&self, candidates: impl Iterator<Item = PathBuf>) -> Result<()> {
        // Acquisition failure is fatal here: there is only one worker.
        let mut session = self.cache.acquire().map_err(WarmError::Cache)?;

        for path in candidates {
            if self.progress.cancel_requested() {
                debug!("Cancellation observed, stopping");
                break;
            }

            warm_one(session.as_mut(), &path, &self.progress);

            if self.reached_total() {
                break;
            }
        }

        // Session released here by drop, on every exit path
        Ok(())
    }

    /// Parallel mode: producer feeds a bounded channel, workers drain it
    fn run_parallel(&self, candidates: Box<dyn Iterator<Item = PathBuf> + Send>) -> Result<()> {
        let (path_tx, path_rx) = bounded::<PathBuf>(self.config.queue_size);

        let producer = {
            let progress = Arc::clone(&self.progress);
            thread::Builder::new()
                .name("walker".to_string())
                .spawn(move || {
                    for path in candidates {
                        if progress.cancel_requested() {
                            break;
                        }
                        // Send fails only when every worker is gone
                        if path_tx.send(path).is_err() {
                            break;
                        }
                    }
                })
                .map_err(WarmError::Io)?
        };

        let mut handles = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            let cache = Arc::clone(&self.cache);
            let progress = Arc::clone(&self.progress);
            let rx = path_rx.clone();

            let handle = thread::Builder::new()
                .name(format!("warmer-{}", id))
                .spawn(move || worker_loop(id, cache, rx, progress))
                .map_err(WarmError::Io)?;

            handles.push(handle);
        }
        drop(path_rx);

        let _ = producer.join();

        let mut failed = 0;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(worker = id, error = %e, "Worker terminated with error");
                    failed += 1;
                }
                Err(_) => {
                    warn!(worker = id, "Worker panicked");
                    failed += 1;
                }
            }
        }

        if failed == self.config.worker_count {
            return Err(WarmError::Worker(WorkerError::AllWorkersFailed));
        }

        Ok(())
    }

    /// Check the completion rule for a known total
    ///
    /// An estimated total may drift from what the stream actually yields, so
    /// reaching it ends the run even before exhaustion.
    fn reached_total(&self) -> bool {
        match self.progress.total() {
            Some(total) => self.progress.processed() >= total,
            None => false,
        }
    }

    fn summarize(&self, start: Instant) -> WarmSummary {
        WarmSummary {
            state: self.progress.state(),
            processed: self.progress.processed(),
            total: self.progress.total(),
            duration: start.elapsed(),
        }
    }
}

/// Main worker loop (parallel mode)
///
/// The session is created lazily on the first item, so a worker that never
/// receives work never touches the cache service, and is released exactly
/// once when the loop exits, whatever the reason.
fn worker_loop(
    id: usize,
    cache: Arc<dyn CacheService>,
    rx: Receiver<PathBuf>,
    progress: Arc<Progress>,
) -> std::result::Result<(), WorkerError> {
    let mut session: Option<Box<dyn CacheSession>> = None;

    while let Ok(path) = rx.recv() {
        // In-flight items always finish; the check sits between items
        if progress.cancel_requested() {
            debug!(worker = id, "Cancellation observed, stopping");
            break;
        }

        if session.is_none() {
            match cache.acquire() {
                Ok(s) => {
                    debug!(worker = id, "Cache session acquired");
                    session = Some(s);
                }
                Err(e) => {
                    warn!(worker = id, error = %e, "Session acquisition failed");
                    return Err(WorkerError::InitFailed {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(session) = session.as_mut() {
            warm_one(session.as_mut(), &path, &progress);
        }

        if let Some(total) = progress.total() {
            if progress.processed() >= total {
                break;
            }
        }
    }

    debug!(worker = id, "Worker finished");
    Ok(())
}

/// Process a single candidate: populate, swallow failure, count the attempt
fn warm_one(session: &mut dyn CacheSession, path: &Path, progress: &Progress) {
    progress.set_current(path);

    if let Err(e) = session.populate(path) {
        // Best-effort policy: a locked or broken file never aborts the run
        debug!(path = %path.display(), error = %e, "Populate failed, continuing");
    }

    progress.record_processed();
}

/// Warm a single file directly, bypassing the pipeline
///
/// The fast path for a file argument: one session, one populate, release.
pub fn warm_single(cache: &dyn CacheService, path: &Path) -> Result<()> {
    let mut session = cache.acquire().map_err(WarmError::Cache)?;
    session.populate(path).map_err(WarmError::Cache)?;
    Ok(())
}

/// Drop the host scheduling priority before bulk work starts
///
/// Best-effort environmental courtesy, never a correctness requirement.
#[cfg(unix)]
fn lower_process_priority() {
    let rc = unsafe { libc::nice(10) };
    debug!(nice = rc, "Lowered process priority");
}

#[cfg(not(unix))]
fn lower_process_priority() {}
