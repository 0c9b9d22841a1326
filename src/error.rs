//! Error types for thumb-warmer
//!
//! The error hierarchy covers:
//! - Cache service errors (session acquisition, per-item populate)
//! - Configuration and CLI errors
//! - Worker thread errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Scanning and per-item errors are swallowed inside the pipeline; only
//!   configuration and session-acquisition errors reach the caller
//! - Preserve error chains for debugging

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the thumb-warmer application
#[derive(Error, Debug)]
pub enum WarmError {
    /// Cache service errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cache service errors
///
/// Only `AcquireFailed` is fatal to a worker. `PopulateFailed` is always
/// swallowed by the run loop: the item still counts as processed.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to open a session with the cache service
    #[error("Failed to acquire cache session: {reason}")]
    AcquireFailed { reason: String },

    /// A single populate call failed
    #[error("Failed to populate thumbnail for '{path}': {reason}")]
    PopulateFailed { path: PathBuf, reason: String },
}

impl CacheError {
    /// Check if this error is fatal to the worker holding the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, CacheError::AcquireFailed { .. })
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Root path error
    #[error("Invalid root path '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// Worker initialization failed
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },

    /// Every worker failed to acquire a cache session
    #[error("All workers failed to acquire a cache session")]
    AllWorkersFailed,
}

/// Result type alias for WarmError
pub type Result<T> = std::result::Result<T, WarmError>;

/// Result type alias for CacheError
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_fatality() {
        let acquire = CacheError::AcquireFailed {
            reason: "service unavailable".into(),
        };
        assert!(acquire.is_fatal());

        let populate = CacheError::PopulateFailed {
            path: "/data/a.png".into(),
            reason: "decode failed".into(),
        };
        assert!(!populate.is_fatal());
    }

    #[test]
    fn test_error_conversion() {
        let cache_err = CacheError::AcquireFailed {
            reason: "no backend".into(),
        };
        let warm_err: WarmError = cache_err.into();
        assert!(matches!(warm_err, WarmError::Cache(_)));
    }
}
