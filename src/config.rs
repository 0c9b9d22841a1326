//! Configuration types for thumb-warmer
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum queue size
const MIN_QUEUE_SIZE: usize = 16;

/// Bulk thumbnail cache warmer for directory trees
#[derive(Parser, Debug, Clone)]
#[command(
    name = "thumb-warmer",
    version,
    about = "Warm the thumbnail cache for every media file under a directory",
    long_about = "Walks a directory tree and asks the thumbnail cache service to generate\n\
                  a thumbnail for every matching media file, so a file browser later\n\
                  renders them instantly.\n\n\
                  Pointing it at a single file warms just that file and skips the pipeline.",
    after_help = "EXAMPLES:\n    \
        thumb-warmer ~/Pictures -r\n    \
        thumb-warmer /mnt/media -r -w 8 --count-first\n    \
        thumb-warmer ~/Pictures --sequential --exclude '\\.cache'\n    \
        thumb-warmer ~/Pictures/photo.jpg"
)]
pub struct CliArgs {
    /// Directory to warm (or a single file for the fast path)
    #[arg(value_name = "PATH")]
    pub root: PathBuf,

    /// Recurse into subdirectories
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Process items on a single worker instead of a pool
    #[arg(short = 's', long)]
    pub sequential: bool,

    /// Number of worker threads (parallel mode)
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Candidate queue size (controls memory usage)
    #[arg(long, default_value = "1024", value_name = "NUM")]
    pub queue_size: usize,

    /// Count candidates first for determinate progress (extra scan pass)
    #[arg(short = 'c', long)]
    pub count_first: bool,

    /// Extension allow-list file (comma/whitespace separated tokens)
    #[arg(long, value_name = "FILE")]
    pub extensions: Option<PathBuf>,

    /// Exclude paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show skipped directories and per-item failures)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Work distribution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One worker, one session, candidates in walk order
    Sequential,
    /// Bounded worker pool, one session per worker, no ordering guarantee
    Parallel,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct WarmConfig {
    /// Root of the tree to warm
    pub root: PathBuf,

    /// Recurse into subdirectories
    pub recursive: bool,

    /// Sequential or parallel processing
    pub mode: RunMode,

    /// Number of worker threads (parallel mode)
    pub worker_count: usize,

    /// Candidate queue capacity (parallel mode)
    pub queue_size: usize,

    /// Materialize the candidate list first for determinate progress
    pub count_first: bool,

    /// Extension allow-list file override
    pub extensions_file: Option<PathBuf>,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl WarmConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if !args.root.exists() {
            return Err(ConfigError::InvalidRoot {
                path: args.root,
                reason: "Path does not exist".into(),
            });
        }

        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.queue_size < MIN_QUEUE_SIZE {
            return Err(ConfigError::InvalidQueueSize {
                size: args.queue_size,
                min: MIN_QUEUE_SIZE,
            });
        }

        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mode = if args.sequential {
            RunMode::Sequential
        } else {
            RunMode::Parallel
        };

        Ok(Self {
            root: args.root,
            recursive: args.recursive,
            mode,
            worker_count: args.workers,
            queue_size: args.queue_size,
            count_first: args.count_first,
            extensions_file: args.extensions,
            exclude_patterns,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(root: PathBuf) -> CliArgs {
        CliArgs {
            root,
            recursive: true,
            sequential: false,
            workers: 4,
            queue_size: 1024,
            count_first: false,
            extensions: None,
            exclude_patterns: vec![],
            quiet: true,
            verbose: false,
        }
    }

    #[test]
    fn test_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = WarmConfig::from_args(base_args(dir.path().to_path_buf())).unwrap();
        assert_eq!(config.mode, RunMode::Parallel);
        assert_eq!(config.worker_count, 4);
        assert!(config.recursive);
        assert!(!config.show_progress);
    }

    #[test]
    fn test_missing_root_rejected() {
        let args = base_args(PathBuf::from("/nonexistent/tree"));
        assert!(matches!(
            WarmConfig::from_args(args),
            Err(ConfigError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_worker_count_bounds() {
        let dir = tempfile::tempdir().unwrap();

        let mut args = base_args(dir.path().to_path_buf());
        args.workers = 0;
        assert!(matches!(
            WarmConfig::from_args(args),
            Err(ConfigError::InvalidWorkerCount { .. })
        ));

        let mut args = base_args(dir.path().to_path_buf());
        args.workers = 10_000;
        assert!(matches!(
            WarmConfig::from_args(args),
            Err(ConfigError::InvalidWorkerCount { .. })
        ));
    }

    #[test]
    fn test_queue_size_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path().to_path_buf());
        args.queue_size = 1;
        assert!(matches!(
            WarmConfig::from_args(args),
            Err(ConfigError::InvalidQueueSize { .. })
        ));
    }

    #[test]
    fn test_bad_exclude_pattern_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path().to_path_buf());
        args.exclude_patterns = vec!["[unclosed".into()];
        assert!(matches!(
            WarmConfig::from_args(args),
            Err(ConfigError::InvalidExcludePattern { .. })
        ));
    }

    #[test]
    fn test_sequential_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = base_args(dir.path().to_path_buf());
        args.sequential = true;
        let config = WarmConfig::from_args(args).unwrap();
        assert_eq!(config.mode, RunMode::Sequential);
    }
}
