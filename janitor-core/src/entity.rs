//! Analyzed entities and the usage-matrix contract entity types implement.
//!
//! An [`AnalyzedEntity`] pairs an identity (root, name, defining file) with
//! the [`UsageSource`] of its entity type. The source declares which needles
//! count as usage; the entity memoizes them and accumulates scan results.
//!
//! ```text
//! UsageSource::compute_usage_matrix ──► process_usage_needle (per needle)
//!                                              │
//!                                              ▼
//!                                  UsageMatrixCell (compute once)
//!                                              │
//!                     usage_pattern() ◄────────┴────────► Scanner
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::{JanitorError, JanitorResult};
use crate::needle::Needle;
use crate::report::{EntityReport, UsageVerdict};
use crate::scan::ScanOutcome;

/// Identity of an entity: what it is called and where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityIdentity {
    /// Absolute root defining the search scope
    pub root: PathBuf,
    /// Route name, dotted view name, asset path, ...
    pub name: String,
    /// File that defines the entity, if known
    pub definition: Option<PathBuf>,
}

/// Capability set every entity type (route, view, asset, ...) provides.
///
/// `compute_usage_matrix` declares the needles that count as usage.
/// `process_usage_needle` runs on each of them before the matrix is cached
/// and may rewrite or extend a needle; the default leaves it untouched.
pub trait UsageSource: Send + Sync {
    /// Label used in reports ("route", "view", ...).
    fn kind(&self) -> &'static str;

    fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>>;

    fn process_usage_needle(
        &self,
        _entity: &EntityIdentity,
        needle: Needle,
    ) -> JanitorResult<Needle> {
        Ok(needle)
    }
}

/// Error attached to an entity whose analysis did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityError {
    pub kind: String,
    pub message: String,
}

impl From<&JanitorError> for EntityError {
    fn from(err: &JanitorError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Which needle was credited for a file occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub file: String,
    pub needle: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Compute-once cell holding an entity's processed usage matrix.
///
/// The compute closure runs with the lock held, so concurrent first
/// accesses block until one computation finishes and then share its
/// result. A failed computation stores nothing.
#[derive(Debug, Default)]
pub struct UsageMatrixCell {
    computed: AtomicBool,
    value: Mutex<Option<Arc<[Needle]>>>,
}

impl UsageMatrixCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_computed(&self) -> bool {
        self.computed.load(Ordering::Acquire)
    }

    /// Cached matrix, without computing it.
    pub fn get(&self) -> Option<Arc<[Needle]>> {
        if !self.is_computed() {
            return None;
        }
        lock(&self.value).clone()
    }

    pub fn get_or_try_init<F>(&self, compute: F) -> JanitorResult<Arc<[Needle]>>
    where
        F: FnOnce() -> JanitorResult<Vec<Needle>>,
    {
        let mut slot = lock(&self.value);
        if let Some(matrix) = slot.as_ref() {
            return Ok(Arc::clone(matrix));
        }

        let matrix: Arc<[Needle]> = compute()?.into();
        *slot = Some(Arc::clone(&matrix));
        self.computed.store(true, Ordering::Release);
        Ok(matrix)
    }
}

/// Builds the combined search expression for a matrix: every fragment of
/// every needle, de-duplicated in first-seen order, joined with `|`.
pub fn combined_pattern(matrix: &[Needle]) -> String {
    let mut fragments: Vec<&str> = Vec::new();
    for needle in matrix {
        for pattern in needle.patterns() {
            if !fragments.contains(&pattern.as_str()) {
                fragments.push(pattern);
            }
        }
    }
    fragments.join("|")
}

#[derive(Debug, Clone, Default)]
struct UsageState {
    usage: i64,
    occurrences: Vec<String>,
    attributions: Vec<Attribution>,
    error: Option<EntityError>,
}

/// A unit under analysis: one route, one view, one asset.
pub struct AnalyzedEntity {
    identity: EntityIdentity,
    source: Arc<dyn UsageSource>,
    matrix: UsageMatrixCell,
    state: Mutex<UsageState>,
}

impl std::fmt::Debug for AnalyzedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzedEntity")
            .field("kind", &self.source.kind())
            .field("identity", &self.identity)
            .field("matrix_computed", &self.matrix.is_computed())
            .finish()
    }
}

impl AnalyzedEntity {
    pub fn new(
        root: impl Into<PathBuf>,
        name: impl Into<String>,
        source: Arc<dyn UsageSource>,
    ) -> Self {
        Self {
            identity: EntityIdentity {
                root: root.into(),
                name: name.into(),
                definition: None,
            },
            source,
            matrix: UsageMatrixCell::new(),
            state: Mutex::new(UsageState::default()),
        }
    }

    /// Set the file that defines this entity.
    pub fn with_definition(mut self, definition: impl Into<PathBuf>) -> Self {
        self.identity.definition = Some(definition.into());
        self
    }

    pub fn identity(&self) -> &EntityIdentity {
        &self.identity
    }

    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }

    pub fn root(&self) -> &Path {
        &self.identity.root
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn definition(&self) -> Option<&Path> {
        self.identity.definition.as_deref()
    }

    /// The processed usage matrix, computed on first access and shared
    /// afterwards.
    pub fn usage_matrix(&self) -> JanitorResult<Arc<[Needle]>> {
        self.matrix.get_or_try_init(|| {
            self.source
                .compute_usage_matrix(&self.identity)?
                .into_iter()
                .map(|needle| self.source.process_usage_needle(&self.identity, needle))
                .collect()
        })
    }

    /// Combined alternation of every needle fragment in the matrix.
    pub fn usage_pattern(&self) -> JanitorResult<String> {
        Ok(combined_pattern(&self.usage_matrix()?))
    }

    pub fn usage(&self) -> i64 {
        lock(&self.state).usage
    }

    pub fn occurrences(&self) -> Vec<String> {
        lock(&self.state).occurrences.clone()
    }

    pub fn attributions(&self) -> Vec<Attribution> {
        lock(&self.state).attributions.clone()
    }

    pub fn error(&self) -> Option<EntityError> {
        lock(&self.state).error.clone()
    }

    /// Fold one scan into the entity.
    ///
    /// Each matched needle adds its weight once, however many files it
    /// matched in. Each file is credited to the first matching needle in
    /// matrix order. All updates land under one lock.
    pub fn record_scan(&self, matrix: &[Needle], outcome: &ScanOutcome) {
        let delta: i64 = outcome
            .matched_needles()
            .iter()
            .filter_map(|&idx| matrix.get(idx))
            .map(Needle::weight)
            .sum();

        let mut state = lock(&self.state);
        for file_match in outcome.matches() {
            if state.occurrences.contains(&file_match.file) {
                continue;
            }
            state.occurrences.push(file_match.file.clone());
            if let Some(needle) = file_match.needles.first().and_then(|&idx| matrix.get(idx)) {
                state.attributions.push(Attribution {
                    file: file_match.file.clone(),
                    needle: needle.name().to_string(),
                });
            }
        }
        state.usage += delta;
    }

    /// Attach an error, leaving usage and occurrences untouched.
    pub fn record_failure(&self, err: &JanitorError) {
        lock(&self.state).error = Some(EntityError::from(err));
    }

    /// Plain report structure for this entity.
    ///
    /// Uses the cached matrix only; an entity whose matrix never computed
    /// reports an empty matrix and pattern.
    pub fn to_report(&self, threshold: i64) -> EntityReport {
        let matrix = self.matrix.get();
        let usage_pattern = matrix
            .as_deref()
            .map(combined_pattern)
            .unwrap_or_default();
        let state = lock(&self.state).clone();
        let verdict = UsageVerdict::classify(
            state.usage,
            state.occurrences.len(),
            state.error.is_some(),
            threshold,
        );

        EntityReport {
            kind: self.kind().to_string(),
            root: self.identity.root.clone(),
            name: self.identity.name.clone(),
            definition: self.identity.definition.clone(),
            usage: state.usage,
            usage_matrix: matrix.map(|m| m.to_vec()).unwrap_or_default(),
            usage_pattern,
            occurrences: state.occurrences,
            attributions: state.attributions,
            error: state.error,
            verdict,
        }
    }
}
