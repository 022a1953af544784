//! Parallel, deterministic corpus loading and usage scanning.
//!
//! Performance characteristics:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - File contents read once per run, in parallel, then shared read-only
//!   by every entity scan
//! - Per-entity scans run across files in parallel; `collect` keeps
//!   traversal order
//!
//! Traversal is sorted by file name so occurrence order is stable between
//! runs. Files that cannot be used (permission errors, binary or non-UTF-8
//! content, oversized files) are skipped and recorded, never dropped.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{JanitorError, JanitorResult};
use crate::matcher::UsageMatcher;

/// Directories excluded by default (VCS metadata, dependency and build output).
pub const EXCLUDED_DIRS: &[&str] = &[".git", "node_modules", "vendor", "target", "storage"];

/// Files larger than this are skipped unless configured otherwise.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8192;

/// Scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Directory names pruned anywhere in the tree
    pub excluded_dirs: Vec<String>,
    /// Regexes matched against `/`-separated relative paths
    pub excluded_paths: Vec<String>,
    /// If set, only files with one of these extensions are scanned
    pub extensions: Option<Vec<String>>,
    pub max_file_size: u64,
    /// Skip an entity's own defining file when scanning for it
    pub exclude_definition: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            excluded_dirs: EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            excluded_paths: Vec::new(),
            extensions: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            exclude_definition: true,
        }
    }
}

/// A readable text file loaded into memory.
#[derive(Debug, Clone)]
pub struct CorpusFile {
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated
    pub relative: String,
    pub contents: String,
}

/// A file left out of the corpus, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Every scannable file under a root, in traversal order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub root: PathBuf,
    pub files: Vec<CorpusFile>,
    pub skipped: Vec<SkippedFile>,
}

impl Corpus {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Needles that matched one file, ascending matrix indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    pub file: String,
    pub needles: Vec<usize>,
}

/// Result of scanning a corpus for one entity.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    matches: Vec<FileMatch>,
    matched: Vec<usize>,
}

impl ScanOutcome {
    pub fn new(matches: Vec<FileMatch>) -> Self {
        let matched: BTreeSet<usize> = matches
            .iter()
            .flat_map(|m| m.needles.iter().copied())
            .collect();
        Self {
            matches,
            matched: matched.into_iter().collect(),
        }
    }

    /// Matching files in traversal order.
    pub fn matches(&self) -> &[FileMatch] {
        &self.matches
    }

    /// Distinct needles that matched in at least one file.
    pub fn matched_needles(&self) -> &[usize] {
        &self.matched
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// `/`-separated path of `path` relative to `root`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Walks a root into a [`Corpus`] and matches entities against it.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    options: ScanOptions,
    excluded_paths: RegexSet,
}

impl Scanner {
    /// Fails with `InvalidPattern` if an exclusion regex does not compile.
    pub fn new(root: impl Into<PathBuf>, options: ScanOptions) -> JanitorResult<Self> {
        let excluded_paths = RegexSet::new(&options.excluded_paths).map_err(|e| {
            JanitorError::invalid_pattern(options.excluded_paths.join("|"), e.to_string())
        })?;
        Ok(Self {
            root: root.into(),
            options,
            excluded_paths,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Checks if a directory entry should be pruned.
    ///
    /// Runs inside `filter_entry`, so a pruned directory's subtree is never
    /// visited.
    fn is_excluded_dir(&self, entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && (entry
                .file_name()
                .to_str()
                .is_some_and(|name| excludes.contains(name))
                || self.is_excluded_path(entry.path()))
    }

    fn is_excluded_path(&self, path: &Path) -> bool {
        !self.excluded_paths.is_empty()
            && self.excluded_paths.is_match(&relative_path(&self.root, path))
    }

    fn has_wanted_extension(&self, path: &Path) -> bool {
        match &self.options.extensions {
            None => true,
            Some(wanted) => {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                wanted
                    .iter()
                    .any(|ext| name.ends_with(&format!(".{}", ext.trim_start_matches('.'))))
            }
        }
    }

    fn read_file(&self, path: &Path) -> JanitorResult<CorpusFile> {
        let metadata =
            fs::metadata(path).map_err(|e| JanitorError::unreadable(path, e.to_string()))?;
        if metadata.len() > self.options.max_file_size {
            return Err(JanitorError::unreadable(
                path,
                format!(
                    "file is {} bytes, limit is {}",
                    metadata.len(),
                    self.options.max_file_size
                ),
            ));
        }

        let bytes = fs::read(path).map_err(|e| JanitorError::unreadable(path, e.to_string()))?;
        if bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0) {
            return Err(JanitorError::unreadable(path, "binary content"));
        }
        let contents = String::from_utf8(bytes)
            .map_err(|_| JanitorError::unreadable(path, "content is not valid UTF-8"))?;

        Ok(CorpusFile {
            path: path.to_path_buf(),
            relative: relative_path(&self.root, path),
            contents,
        })
    }

    /// Walk the root and read every candidate file.
    ///
    /// Traversal errors and unreadable files end up in `Corpus::skipped`;
    /// this only fails if nothing under the root can be listed at all.
    pub fn load_corpus(&self) -> JanitorResult<Corpus> {
        let excludes: HashSet<&str> = self
            .options
            .excluded_dirs
            .iter()
            .map(String::as_str)
            .collect();

        let mut candidates: Vec<PathBuf> = Vec::new();
        let mut skipped: Vec<SkippedFile> = Vec::new();

        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_excluded_dir(e, &excludes))
        {
            match entry {
                Ok(e) => {
                    let path = e.path();
                    if e.file_type().is_file()
                        && self.has_wanted_extension(path)
                        && !self.is_excluded_path(path)
                    {
                        candidates.push(path.to_path_buf());
                    }
                }
                Err(e) if e.depth() == 0 => {
                    return Err(JanitorError::invalid_root(&self.root, e.to_string()));
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let loaded: Vec<JanitorResult<CorpusFile>> =
            candidates.par_iter().map(|p| self.read_file(p)).collect();

        let mut files = Vec::with_capacity(loaded.len());
        for result in loaded {
            match result {
                Ok(file) => files.push(file),
                Err(err) => {
                    debug!(error = %err, "skipping file");
                    let path = err.path().cloned().unwrap_or_default();
                    let reason = match err {
                        JanitorError::ScanFileUnreadable { message, .. } => message,
                        other => other.to_string(),
                    };
                    skipped.push(SkippedFile { path, reason });
                }
            }
        }

        debug!(
            root = %self.root.display(),
            files = files.len(),
            skipped = skipped.len(),
            "corpus loaded"
        );

        Ok(Corpus {
            root: self.root.clone(),
            files,
            skipped,
        })
    }

    /// Match one entity's needles against every corpus file.
    ///
    /// `definition` is left out when `exclude_definition` is set; it may
    /// be absolute or relative to the root.
    pub fn scan(
        &self,
        corpus: &Corpus,
        matcher: &UsageMatcher,
        definition: Option<&Path>,
    ) -> ScanOutcome {
        let excluded = definition
            .filter(|_| self.options.exclude_definition)
            .map(|d| if d.is_absolute() { d.to_path_buf() } else { corpus.root.join(d) });

        let matches: Vec<FileMatch> = corpus
            .files
            .par_iter()
            .filter(|f| excluded.as_deref() != Some(f.path.as_path()))
            .filter_map(|f| {
                let needles = matcher.matching_needles(&f.contents, &f.relative);
                if needles.is_empty() {
                    None
                } else {
                    Some(FileMatch {
                        file: f.relative.clone(),
                        needles,
                    })
                }
            })
            .collect();

        ScanOutcome::new(matches)
    }
}
