//! Cache-population capability
//!
//! The pipeline does not render thumbnails itself; it drives an injected
//! service through a three-operation contract: acquire a session, populate
//! one path at a time, release the session. Sessions are owned by exactly
//! one worker and released exactly once when the owning scope ends, whatever
//! the exit path (completion, per-item failure, cancellation).

use crate::error::{CacheError, CacheResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// A thumbnail cache service that can open per-worker sessions
///
/// Implementations must be shareable across worker threads; each worker
/// acquires its own session and never shares it.
pub trait CacheService: Send + Sync {
    /// Open a session with the cache service
    ///
    /// Failure here is fatal to the worker that requested the session.
    fn acquire(&self) -> CacheResult<Box<dyn CacheSession>>;
}

/// An open session with the cache service
///
/// Dropping the session releases it. One session serves many populate calls.
pub trait CacheSession: Send {
    /// Ask the cache to generate and store the thumbnail for one path
    ///
    /// Per-item failures are non-fatal; callers swallow them and keep going.
    fn populate(&mut self, path: &Path) -> CacheResult<()>;
}

/// Number of leading bytes read per file by the readahead warmer
const READAHEAD_BYTES: usize = 64 * 1024;

/// Readahead-based cache warmer
///
/// Stands in for a platform thumbnail-cache service behind the same
/// contract: populating a path opens the file and reads its leading bytes,
/// pulling the data a thumbnailer needs into the page cache.
#[derive(Debug, Default)]
pub struct ReadaheadCache;

impl ReadaheadCache {
    pub fn new() -> Self {
        Self
    }
}

impl CacheService for ReadaheadCache {
    fn acquire(&self) -> CacheResult<Box<dyn CacheSession>> {
        Ok(Box::new(ReadaheadSession {
            buf: vec![0u8; READAHEAD_BYTES],
        }))
    }
}

/// Session for [`ReadaheadCache`]; reuses one read buffer across items
struct ReadaheadSession {
    buf: Vec<u8>,
}

impl CacheSession for ReadaheadSession {
    fn populate(&mut self, path: &Path) -> CacheResult<()> {
        let mut file = File::open(path).map_err(|e| CacheError::PopulateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let read = file
            .read(&mut self.buf)
            .map_err(|e| CacheError::PopulateFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        trace!(path = %path.display(), bytes = read, "Readahead complete");
        Ok(())
    }
}
