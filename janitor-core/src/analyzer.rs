//! Per-entity-type analysis: discover, scan, report.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use janitor_core::prelude::*;
//!
//! let report = Analyzer::new("/path/to/app")
//!     .exclude_dirs(["public/build"])
//!     .ignore_patterns(["debugbar.*"])
//!     .threshold(0)
//!     .analyze_kind(Arc::new(Views::default()))?;
//!
//! for entity in report.with_verdict(UsageVerdict::Unused) {
//!     println!("Unused view: {}", entity.name);
//! }
//! ```

use std::collections::HashSet;
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::entity::{AnalyzedEntity, UsageSource};
use crate::error::{JanitorError, JanitorResult};
use crate::matcher::UsageMatcher;
use crate::report::AnalysisReport;
use crate::scan::{Corpus, ScanOptions, Scanner};

/// One discovered candidate entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub definition: Option<PathBuf>,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            definition: None,
        }
    }

    pub fn with_definition(mut self, definition: impl Into<PathBuf>) -> Self {
        self.definition = Some(definition.into());
        self
    }
}

/// Supplies the candidate entities of one type under a root.
pub trait EntityDiscovery: Send + Sync {
    fn discover(&self, root: &Path) -> JanitorResult<Vec<Candidate>>;
}

/// Builder for configuring and running one analysis pass.
#[derive(Debug, Clone)]
pub struct Analyzer {
    /// Root path of the codebase to analyze
    root: PathBuf,

    /// Corpus traversal settings
    options: ScanOptions,

    /// Entity names or patterns to leave out of the report
    ignored_patterns: Vec<String>,

    /// Scores at or below this count as not used
    threshold: i64,

    /// Scan entities on the rayon pool
    parallel: bool,
}

impl Analyzer {
    /// Create a new analysis builder for the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: ScanOptions::default(),
            ignored_patterns: Vec::new(),
            threshold: 0,
            parallel: true,
        }
    }

    /// Replace the scan options.
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Add directory names to prune during traversal.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options
            .excluded_dirs
            .extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Add patterns for entity names to ignore.
    pub fn ignore_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn threshold(mut self, threshold: i64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Scan entities one at a time instead of on the rayon pool.
    pub fn sequential(mut self, enabled: bool) -> Self {
        self.parallel = !enabled;
        self
    }

    /// Check the root exists, is a directory and can be listed.
    ///
    /// Returns the canonical root.
    pub fn validate_root(&self) -> JanitorResult<PathBuf> {
        let root = fs::canonicalize(&self.root)
            .map_err(|e| JanitorError::invalid_root(&self.root, e.to_string()))?;
        if !root.is_dir() {
            return Err(JanitorError::invalid_root(&root, "not a directory"));
        }
        fs::read_dir(&root).map_err(|e| JanitorError::invalid_root(&root, e.to_string()))?;
        Ok(root)
    }

    /// Check if an entity name matches any ignored pattern.
    fn is_ignored(&self, name: &str) -> bool {
        for pattern in &self.ignored_patterns {
            if let Some(prefix) = pattern.strip_suffix('*') {
                if name.starts_with(prefix) {
                    return true;
                }
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                if name.ends_with(suffix) {
                    return true;
                }
            } else if name == pattern || name.contains(pattern.as_str()) {
                return true;
            }
        }
        false
    }

    /// Phase 1: one entity per candidate, ignored and duplicate names dropped.
    pub fn discover(
        &self,
        root: &Path,
        discovery: &dyn EntityDiscovery,
        source: &Arc<dyn UsageSource>,
    ) -> JanitorResult<Vec<AnalyzedEntity>> {
        let candidates = discovery
            .discover(root)
            .map_err(|e| match e {
                JanitorError::Discovery { .. } => e,
                other => JanitorError::discovery(source.kind(), other.to_string()),
            })?;

        let mut seen = HashSet::new();
        let entities: Vec<AnalyzedEntity> = candidates
            .into_iter()
            .filter(|c| !self.is_ignored(&c.name))
            .filter(|c| seen.insert(c.name.clone()))
            .map(|c| {
                let entity = AnalyzedEntity::new(root, c.name, Arc::clone(source));
                match c.definition {
                    Some(definition) => entity.with_definition(definition),
                    None => entity,
                }
            })
            .collect();

        info!(kind = source.kind(), count = entities.len(), "entities discovered");
        Ok(entities)
    }

    /// Phase 2: scan every entity, attaching failures instead of returning them.
    ///
    /// A panic inside one entity's usage source is caught and attached to
    /// that entity as an `AnalysisFailure`.
    pub fn scan_entities(&self, scanner: &Scanner, corpus: &Corpus, entities: &[AnalyzedEntity]) {
        let run = |entity: &AnalyzedEntity| {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                scan_entity(scanner, corpus, entity)
            }))
            .unwrap_or_else(|payload| {
                Err(JanitorError::analysis_failure(
                    entity.name(),
                    format!("panicked: {}", panic_message(&*payload)),
                ))
            });
            if let Err(err) = result {
                let err = err.for_entity(entity.name());
                warn!(entity = entity.name(), error = %err, "entity analysis failed");
                entity.record_failure(&err);
            }
        };

        if self.parallel {
            entities.par_iter().for_each(run);
        } else {
            entities.iter().for_each(run);
        }
    }

    /// Run discovery, scanning and reporting for one entity type.
    ///
    /// Only an invalid root, a bad scan configuration or a failed
    /// discovery abort the run.
    pub fn analyze(
        &self,
        discovery: &dyn EntityDiscovery,
        source: Arc<dyn UsageSource>,
    ) -> JanitorResult<AnalysisReport> {
        // 1. Validate root before anything else touches it
        let root = self.validate_root()?;
        let scanner = Scanner::new(&root, self.options.clone())?;

        // 2. Discover
        let entities = self.discover(&root, discovery, &source)?;

        // 3. Scan
        let corpus = scanner.load_corpus()?;
        if !corpus.skipped.is_empty() {
            warn!(count = corpus.skipped_count(), "files skipped during corpus load");
        }
        self.scan_entities(&scanner, &corpus, &entities);

        // 4. Report
        let reports = entities
            .iter()
            .map(|e| e.to_report(self.threshold))
            .collect();
        let report = AnalysisReport::new(
            source.kind(),
            root,
            self.threshold,
            reports,
            corpus.files.len(),
            corpus.skipped,
        );

        info!(
            kind = %report.kind,
            used = report.stats.used,
            unused = report.stats.unused,
            incomplete = report.stats.incomplete,
            "analysis complete"
        );
        Ok(report)
    }

    /// Analyze an entity type that discovers its own candidates.
    pub fn analyze_kind<K>(&self, kind: Arc<K>) -> JanitorResult<AnalysisReport>
    where
        K: EntityDiscovery + UsageSource + 'static,
    {
        let source: Arc<dyn UsageSource> = kind.clone();
        self.analyze(kind.as_ref(), source)
    }
}

/// Text of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}

/// Compute, compile and scan for a single entity, folding the result in.
fn scan_entity(scanner: &Scanner, corpus: &Corpus, entity: &AnalyzedEntity) -> JanitorResult<()> {
    let matrix = entity.usage_matrix()?;
    let matcher = UsageMatcher::compile(&matrix)?;
    let outcome = scanner.scan(corpus, &matcher, entity.definition());
    debug!(
        entity = entity.name(),
        files = outcome.matches().len(),
        needles = outcome.matched_needles().len(),
        "entity scanned"
    );
    entity.record_scan(&matrix, &outcome);
    Ok(())
}
