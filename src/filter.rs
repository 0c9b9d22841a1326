//! Extension filter policy
//!
//! Decides which files are eligible for thumbnail warming. The allow-list is
//! loaded from an optional token file (comma or whitespace separated); any
//! load failure falls back to the built-in default set. Loading never errors.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default token file looked up when no explicit path is given
pub const DEFAULT_EXTENSIONS_FILE: &str = "thumbnail-extensions.txt";

/// Built-in extension allow-list, used whenever no usable external list exists
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "avif", "bmp", "gif", "heic", "jpg", "jpeg", "mkv", "mov", "mp4", "png", "svg", "tif", "tiff",
    "webp",
];

/// Case-insensitive extension allow-list
///
/// An empty set matches every file. That is an explicit configuration choice
/// (a token file containing only separators), not an accident: the default
/// set is substituted only when the file is absent, unreadable, or yields no
/// tokens at all.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: HashSet<String>,
}

impl ExtensionFilter {
    /// Load the filter from an optional token file
    ///
    /// Falls back to [`DEFAULT_EXTENSIONS_FILE`] in the working directory
    /// when `path` is `None`, and to the built-in list when no usable token
    /// file exists.
    pub fn load(path: Option<&Path>) -> Self {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_EXTENSIONS_FILE));

        match fs::read_to_string(file) {
            Ok(contents) => {
                let filter = Self::parse(&contents);
                if filter.extensions.is_empty() {
                    debug!(file = %file.display(), "Extension file has no tokens, using defaults");
                    Self::default()
                } else {
                    debug!(
                        file = %file.display(),
                        count = filter.extensions.len(),
                        "Loaded extension allow-list"
                    );
                    filter
                }
            }
            Err(e) => {
                debug!(file = %file.display(), error = %e, "No extension file, using defaults");
                Self::default()
            }
        }
    }

    /// Parse a token list (comma or whitespace separated)
    pub fn parse(contents: &str) -> Self {
        let extensions = contents
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(|tok| tok.trim().trim_start_matches('.'))
            .filter(|tok| !tok.is_empty())
            .map(|tok| tok.to_ascii_lowercase())
            .collect();

        Self { extensions }
    }

    /// Build a filter from an explicit set of extensions
    pub fn from_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Build a filter that matches every file
    pub fn match_all() -> Self {
        Self {
            extensions: HashSet::new(),
        }
    }

    /// Check whether a path's extension is in the allow-list
    ///
    /// A file with no extension, or an extension that is not valid UTF-8, is
    /// treated as a non-match. An empty allow-list matches everything.
    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.contains(&ext.to_ascii_lowercase()),
            None => false,
        }
    }

    /// Number of extensions in the allow-list (0 means match-all)
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// True when the filter matches every file
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::from_extensions(DEFAULT_EXTENSIONS.iter().copied())
    }
}
