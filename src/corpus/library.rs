//! Document discovery and loading from a research library on disk.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::types::{Corpus, Document};
use crate::error::{Error, Result};

/// Where the library lives and which files count as documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Library root directory
    pub root: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Maximum number of files loaded (after sorting by path)
    pub max_files: usize,
    /// Accepted file extensions, compared case-insensitively
    pub extensions: Vec<String>,
    /// Directory names never descended into
    pub exclude_dirs: Vec<String>,
    /// Upper-case substrings that exclude a file by name (session logs, personas)
    pub exclude_name_patterns: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            recursive: false,
            max_files: 400,
            extensions: vec!["md".to_string(), "txt".to_string()],
            exclude_dirs: [
                ".git",
                "__pycache__",
                ".venv",
                "venv",
                "node_modules",
                "meeting_archives",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            exclude_name_patterns: vec![
                "SOUL".to_string(),
                "LOG".to_string(),
                "MEETING".to_string(),
            ],
        }
    }
}

impl LibraryConfig {
    /// Config rooted at `root` with default filters.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Enable or disable recursive scanning.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Cap the number of loaded files.
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }
}

/// Loads a [`Corpus`] from a library directory.
pub struct LibraryLoader {
    config: LibraryConfig,
}

impl LibraryLoader {
    pub fn new(config: LibraryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Find candidate document paths, sorted and capped at `max_files`.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let root = &self.config.root;
        if !root.is_dir() {
            return Err(Error::library_not_found(root));
        }

        let root_str = root
            .to_str()
            .ok_or_else(|| Error::config(format!("non UTF-8 library path: {}", root.display())))?;
        let suffix = if self.config.recursive { "**/*" } else { "*" };
        let pattern = format!("{}/{}", glob::Pattern::escape(root_str), suffix);

        let entries = glob::glob(&pattern)
            .map_err(|e| Error::config(format!("invalid library pattern {}: {}", pattern, e)))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable library entry");
                    continue;
                }
            };
            if path.is_file() && self.accepts(root, &path) {
                candidates.push(path);
            }
        }

        candidates.sort();
        candidates.truncate(self.config.max_files);
        Ok(candidates)
    }

    /// Load every discovered document. Unreadable files are skipped with a warning.
    #[instrument(skip(self), fields(root = %self.config.root.display()))]
    pub fn load(&self) -> Result<Corpus> {
        let paths = self.discover()?;
        let mut corpus = Corpus::new();

        for path in &paths {
            let bytes = match fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable document");
                    continue;
                }
            };
            let text = String::from_utf8_lossy(&bytes).into_owned();
            corpus.insert(Document::new(document_id(&self.config.root, path), text));
        }

        debug!(discovered = paths.len(), loaded = corpus.len(), "loaded library");
        Ok(corpus)
    }

    fn accepts(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);

        let in_excluded_dir = relative
            .parent()
            .map(|parent| {
                parent.components().any(|c| match c {
                    Component::Normal(name) => self
                        .config
                        .exclude_dirs
                        .iter()
                        .any(|d| name.to_str() == Some(d.as_str())),
                    _ => false,
                })
            })
            .unwrap_or(false);
        if in_excluded_dir {
            return false;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        let extension_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);
        if !extension_ok {
            return false;
        }

        if self.config.exclude_dirs.iter().any(|d| d == name) {
            return false;
        }

        let upper = name.to_uppercase();
        !self
            .config
            .exclude_name_patterns
            .iter()
            .any(|p| upper.contains(p.to_uppercase().as_str()))
    }
}

/// Document id: path relative to the root, `/`-separated.
fn document_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
