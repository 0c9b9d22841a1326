//! thumb-warmer - Bulk Thumbnail Cache Warmer
//!
//! Walks a directory tree and asks the thumbnail cache service to generate
//! a thumbnail for every matching media file, so a file browser later
//! renders them instantly instead of generating them on demand.
//!
//! # Features
//!
//! - **Error-Isolated Traversal**: A breadth-first walker that skips
//!   unreadable directories and keeps going; one locked folder never aborts
//!   the run.
//!
//! - **Bounded Worker Pool**: Candidates stream through a bounded channel to
//!   a fixed pool of workers, each holding its own cache session for the
//!   whole run.
//!
//! - **Cooperative Cancellation**: A single polled signal; workers stop at
//!   their next check, in-flight items always finish.
//!
//! - **Live Progress**: Shared atomic counters and a forward-only state
//!   machine, polled by a terminal reporter.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        TreeWalker                                │
//! │         breadth-first, skips unreadable directories              │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │ candidate paths
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      WarmRunner                                  │
//! │  ┌─────────┐  ┌─────────┐  ┌─────────┐         ┌─────────┐     │
//! │  │Worker 1 │  │Worker 2 │  │Worker 3 │  ...    │Worker N │     │
//! │  │ session │  │ session │  │ session │         │ session │     │
//! │  └────┬────┘  └────┬────┘  └────┬────┘         └────┬────┘     │
//! │       │            │            │                    │          │
//! │       └────────────┴──────┬─────┴────────────────────┘          │
//! │                           ▼                                      │
//! │                  ┌──────────────────┐                            │
//! │                  │    Progress      │◄──── reporter polls        │
//! │                  │  atomic counters │◄──── ctrl-c cancels        │
//! │                  └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                   thumbnail cache service
//!                  (acquire / populate / release)
//! ```
//!
//! # Example
//!
//! ```bash
//! # Warm a picture library recursively
//! thumb-warmer ~/Pictures -r
//!
//! # Determinate progress bar, 8 workers
//! thumb-warmer /mnt/media -r -w 8 --count-first
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod progress;
pub mod runner;
pub mod walker;

pub use cache::{CacheService, CacheSession, ReadaheadCache};
pub use config::{CliArgs, RunMode, WarmConfig};
pub use error::{Result, WarmError};
pub use filter::ExtensionFilter;
pub use progress::{Progress, ProgressSnapshot, RunState};
pub use runner::{warm_single, WarmRunner, WarmSummary};
pub use walker::TreeWalker;
