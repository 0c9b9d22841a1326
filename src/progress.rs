//! Shared progress state and terminal progress display
//!
//! [`Progress`] is the single object shared between the run loop, the worker
//! threads, the signal handler, and the display. Counters are plain atomics;
//! the run state is a forward-only state machine stored in one atomic byte.
//! Reporters poll at their own cadence - nothing is pushed.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Sentinel stored in the total counter while the candidate count is unknown
const TOTAL_UNKNOWN: u64 = u64::MAX;

/// Run state machine
///
/// Transitions are forward-only (`Idle -> Scanning -> Processing -> Done`)
/// with one exception: `Canceled` may be asserted from any state by an
/// external signal. `Done` is reachable only from `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Scanning = 1,
    Processing = 2,
    Canceled = 3,
    Done = 4,
}

impl RunState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RunState::Idle,
            1 => RunState::Scanning,
            2 => RunState::Processing,
            3 => RunState::Canceled,
            _ => RunState::Done,
        }
    }

    /// True for states no run activity follows
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Canceled | RunState::Done)
    }
}

/// Point-in-time view of the run, for display
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub state: RunState,
    pub processed: u64,
    pub total: Option<u64>,
    pub current: String,
}

/// Shared progress state
///
/// `processed` counts attempts: it is incremented once per populate call
/// after the call returns, whether or not it succeeded. `current` is an
/// advisory display string; concurrent writers may interleave harmlessly.
#[derive(Debug)]
pub struct Progress {
    state: AtomicU8,
    processed: AtomicU64,
    total: AtomicU64,
    cancel: AtomicBool,
    current: Mutex<String>,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(RunState::Idle as u8),
            processed: AtomicU64::new(0),
            total: AtomicU64::new(TOTAL_UNKNOWN),
            cancel: AtomicBool::new(false),
            current: Mutex::new(String::new()),
        }
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Move to `Scanning` (counting pass). No-op unless currently `Idle`.
    pub fn begin_scanning(&self) {
        let _ = self.state.compare_exchange(
            RunState::Idle as u8,
            RunState::Scanning as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Move to `Processing`. No-op unless currently `Idle` or `Scanning`.
    pub fn begin_processing(&self) {
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
                (s == RunState::Idle as u8 || s == RunState::Scanning as u8)
                    .then_some(RunState::Processing as u8)
            });
    }

    /// Move to `Done`. Succeeds only from `Processing`: a canceled run can
    /// never become `Done`.
    pub fn finish(&self) -> bool {
        self.state
            .compare_exchange(
                RunState::Processing as u8,
                RunState::Done as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Request cooperative cancellation and assert the `Canceled` state
    ///
    /// Safe to call from a signal handler thread, at any point in the run.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.state.store(RunState::Canceled as u8, Ordering::SeqCst);
    }

    /// Check the cancellation signal (polled before each unit of work)
    pub fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Record the total candidate count (counting pass completed)
    pub fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::SeqCst);
    }

    /// Total candidate count, if known
    pub fn total(&self) -> Option<u64> {
        match self.total.load(Ordering::Relaxed) {
            TOTAL_UNKNOWN => None,
            n => Some(n),
        }
    }

    /// Count one completed attempt, returning the new processed count
    pub fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of attempts completed so far
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Update the advisory "current item" display string
    pub fn set_current(&self, path: &Path) {
        if let Ok(mut current) = self.current.lock() {
            current.clear();
            current.push_str(&path.display().to_string());
        }
    }

    /// Take a point-in-time snapshot for display
    pub fn snapshot(&self) -> ProgressSnapshot {
        let current = self
            .current
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();

        ProgressSnapshot {
            state: self.state(),
            processed: self.processed(),
            total: self.total(),
            current,
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress reporter that displays run status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    ///
    /// Starts as a spinner; switches to a determinate bar the first time a
    /// snapshot carries a known total.
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display from a snapshot
    pub fn update(&self, snapshot: &ProgressSnapshot) {
        if let Some(total) = snapshot.total {
            if self.bar.length() != Some(total) {
                self.bar.set_length(total);
                self.bar.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                        .expect("Invalid progress template"),
                );
            }
            self.bar.set_position(snapshot.processed);
        }

        let msg = match snapshot.state {
            RunState::Scanning => format!("Scanning... {} candidates", snapshot.processed),
            _ if snapshot.current.is_empty() => format!("Warmed: {}", snapshot.processed),
            _ => format!("Warmed: {} | {}", snapshot.processed, snapshot.current),
        };

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a summary of the run results
pub fn print_summary(state: RunState, processed: u64, total: Option<u64>, duration: Duration) {
    let duration_secs = duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        processed as f64 / duration_secs
    } else {
        0.0
    };

    let heading = match state {
        RunState::Done => style("Warm-up Complete").green().bold(),
        RunState::Canceled => style("Warm-up Canceled").yellow().bold(),
        _ => style("Warm-up Stopped").red().bold(),
    };

    println!();
    println!("{}", heading);
    println!("{}", style("─".repeat(50)).dim());
    match total {
        Some(total) => println!(
            "  {} {} of {}",
            style("Thumbnails:").bold(),
            processed,
            total
        ),
        None => println!("  {} {}", style("Thumbnails:").bold(), processed),
    }
    println!(
        "  {} {:.1}s ({:.0} items/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    println!();
}

/// Print a header at the start of the run
pub fn print_header(root: &str, workers: usize, recursive: bool) {
    println!();
    println!(
        "{} {}",
        style("thumb-warmer").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!(
        "  {} {}",
        style("Recursive:").bold(),
        if recursive { "yes" } else { "no" }
    );
    println!();
}
