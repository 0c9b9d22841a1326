//! Breadth-first, error-isolating filesystem walker
//!
//! Streams candidate file paths under a root directory. The traversal uses
//! an explicit FIFO queue of pending directories rather than a recursive
//! call stack, so memory stays bounded on pathological depth. A directory
//! whose enumeration fails is skipped whole; the walk continues with the
//! next queued directory. One bad directory never aborts a run.
//!
//! Ordering: all matching files of a directory are yielded before any of its
//! subdirectories is expanded. Sibling order at the same depth follows
//! whatever the OS returns and is not guaranteed.

use crate::filter::ExtensionFilter;
use regex::Regex;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Breadth-first walker configured with a filter policy
#[derive(Debug, Clone)]
pub struct TreeWalker {
    filter: ExtensionFilter,
    recursive: bool,
    excludes: Vec<Regex>,
}

impl TreeWalker {
    pub fn new(filter: ExtensionFilter, recursive: bool) -> Self {
        Self {
            filter,
            recursive,
            excludes: Vec::new(),
        }
    }

    /// Add exclude patterns; matching files and subtrees are pruned
    pub fn with_excludes(mut self, excludes: Vec<Regex>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Start a walk from `root`
    ///
    /// Each call is independent and restartable. The returned iterator is
    /// lazy at directory granularity: the next filesystem read happens only
    /// when the current directory's matching files are consumed. Dropping it
    /// early leaks nothing.
    pub fn walk(&self, root: &Path) -> Candidates {
        let mut pending = VecDeque::new();
        pending.push_back(root.to_path_buf());

        Candidates {
            walker: self.clone(),
            pending,
            ready: VecDeque::new(),
            skipped_dirs: 0,
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.excludes.is_empty() {
            return false;
        }
        let text = path.to_string_lossy();
        self.excludes.iter().any(|re| re.is_match(&text))
    }
}

/// Lazy stream of candidate paths produced by [`TreeWalker::walk`]
pub struct Candidates {
    walker: TreeWalker,
    /// FIFO of directories not yet enumerated
    pending: VecDeque<PathBuf>,
    /// Matching files of the most recently enumerated directory
    ready: VecDeque<PathBuf>,
    skipped_dirs: u64,
}

impl Candidates {
    /// Directories skipped so far due to enumeration failures
    pub fn skipped_dirs(&self) -> u64 {
        self.skipped_dirs
    }

    /// Enumerate one pending directory, refilling `ready` and `pending`
    fn expand_next_dir(&mut self) -> bool {
        let dir = match self.pending.pop_front() {
            Some(dir) => dir,
            None => return false,
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                // Permission denied, vanished, or otherwise unreadable:
                // skip the whole directory and keep walking.
                self.skipped_dirs += 1;
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                return true;
            }
        };

        let mut subdirs = Vec::new();

        for entry in entries {
            // A single unreadable entry is ignored, not an error
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            let path = entry.path();
            if self.walker.is_excluded(&path) {
                continue;
            }

            if file_type.is_file() {
                if self.walker.filter.matches(&path) {
                    self.ready.push_back(path);
                }
            } else if file_type.is_dir() && self.walker.recursive {
                subdirs.push(path);
            }
        }

        // Files of this directory drain before any subdirectory expands
        self.pending.extend(subdirs);
        true
    }
}

impl Iterator for Candidates {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(path) = self.ready.pop_front() {
                return Some(path);
            }
            if !self.expand_next_dir() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    /// root/
    ///   a.PNG  b.txt  c.jpg  d
    ///   sub/
    ///     e.png
    ///     deeper/
    ///       f.JPG
    fn build_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        touch(&root.join("a.PNG"));
        touch(&root.join("b.txt"));
        touch(&root.join("c.jpg"));
        touch(&root.join("d"));

        fs::create_dir(root.join("sub")).unwrap();
        touch(&root.join("sub/e.png"));

        fs::create_dir(root.join("sub/deeper")).unwrap();
        touch(&root.join("sub/deeper/f.JPG"));

        dir
    }

    fn names(paths: &[PathBuf]) -> HashSet<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_recursive_walk_visits_everything() {
        let dir = build_tree();
        let walker = TreeWalker::new(
            ExtensionFilter::from_extensions(["png", "jpg"]),
            true,
        );

        let found: Vec<_> = walker.walk(dir.path()).collect();
        assert_eq!(
            names(&found),
            HashSet::from([
                "a.PNG".to_string(),
                "c.jpg".to_string(),
                "e.png".to_string(),
                "f.JPG".to_string(),
            ])
        );
    }

    #[test]
    fn test_non_recursive_walk_stays_in_root() {
        let dir = build_tree();
        let walker = TreeWalker::new(
            ExtensionFilter::from_extensions(["png", "jpg"]),
            false,
        );

        let found: Vec<_> = walker.walk(dir.path()).collect();
        assert_eq!(
            names(&found),
            HashSet::from(["a.PNG".to_string(), "c.jpg".to_string()])
        );
    }

    #[test]
    fn test_filter_applied_case_insensitively() {
        let dir = build_tree();
        let walker = TreeWalker::new(ExtensionFilter::from_extensions(["png", "jpg"]), false);

        let found: Vec<_> = walker.walk(dir.path()).collect();
        // b.txt filtered out, d has no extension
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_breadth_first_ordering() {
        let dir = build_tree();
        let walker = TreeWalker::new(ExtensionFilter::match_all(), true);

        let found: Vec<_> = walker.walk(dir.path()).collect();
        let positions: std::collections::HashMap<String, usize> = found
            .iter()
            .enumerate()
            .map(|(i, p)| (p.file_name().unwrap().to_string_lossy().to_string(), i))
            .collect();

        // Every root file comes before any file inside sub/
        for root_file in ["a.PNG", "b.txt", "c.jpg", "d"] {
            assert!(positions[root_file] < positions["e.png"]);
        }
        // And sub/ files come before sub/deeper/ files
        assert!(positions["e.png"] < positions["f.JPG"]);
    }

    #[test]
    fn test_repeated_walks_yield_same_set() {
        let dir = build_tree();
        let walker = TreeWalker::new(ExtensionFilter::default(), true);

        let first: HashSet<_> = walker.walk(dir.path()).collect();
        let second: HashSet<_> = walker.walk(dir.path()).collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_unreadable_root_yields_nothing() {
        let walker = TreeWalker::new(ExtensionFilter::default(), true);
        let mut walk = walker.walk(Path::new("/nonexistent/tree"));
        assert_eq!(walk.next(), None);
        assert_eq!(walk.skipped_dirs(), 1);
    }

    #[test]
    fn test_early_stop_is_clean() {
        let dir = build_tree();
        let walker = TreeWalker::new(ExtensionFilter::match_all(), true);

        let first = walker.walk(dir.path()).next();
        assert!(first.is_some());

        // A fresh walk after an abandoned one sees the full tree
        let count = walker.walk(dir.path()).count();
        assert_eq!(count, 6);
    }

    #[test]
    fn test_exclude_patterns_prune_subtrees() {
        let dir = build_tree();
        let walker = TreeWalker::new(ExtensionFilter::match_all(), true)
            .with_excludes(vec![Regex::new(r"deeper").unwrap()]);

        let found: Vec<_> = walker.walk(dir.path()).collect();
        assert!(!names(&found).contains("f.JPG"));
        assert!(names(&found).contains("e.png"));
    }

    #[cfg(unix)]
    #[test]
    fn test_inaccessible_subtree_is_isolated() {
        use std::os::unix::fs::PermissionsExt;

        // Permission bits don't restrict root
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let dir = build_tree();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        touch(&locked.join("g.png"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let walker = TreeWalker::new(ExtensionFilter::from_extensions(["png", "jpg"]), true);
        let mut walk = walker.walk(dir.path());
        let found: Vec<_> = walk.by_ref().collect();

        // Restore permissions so the tempdir can be removed
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Siblings of the locked directory are fully visited
        assert_eq!(
            names(&found),
            HashSet::from([
                "a.PNG".to_string(),
                "c.jpg".to_string(),
                "e.png".to_string(),
                "f.JPG".to_string(),
            ])
        );
        assert_eq!(walk.skipped_dirs(), 1);
    }
}
