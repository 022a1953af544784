//! janitor-core: static usage analysis for routes, views and assets
//!
//! Given a codebase root, janitor enumerates entities of one type and
//! searches every text file under the root for patterns that reference
//! them. Each entity ends up with a usage score and the files where it was
//! found; the caller decides what score counts as "used".
//!
//! Matching is textual. Results are advisory: a reference built at runtime
//! from string fragments is invisible to janitor.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use janitor_core::prelude::*;
//!
//! let report = Analyzer::new("/path/to/app").analyze_kind(Arc::new(Routes::default()))?;
//!
//! for route in report.with_verdict(UsageVerdict::Unused) {
//!     println!("Unused route: {}", route.name);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`needle`]: Named pattern groups with a usage weight
//! - [`entity`]: The entity contract and the memoized usage matrix
//! - [`matcher`]: Compiled usage matrix
//! - [`scan`]: Corpus loading and per-entity scanning
//! - [`analyzer`]: Discover, scan and report for one entity type
//! - [`report`]: Report structures and output
//! - [`error`]: Typed error handling
//! - `kinds`: Built-in route, view and asset entity types
//!
//! # Cargo Features
//!
//! - `kinds` (default): Built-in entity types

pub mod analyzer;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod needle;
pub mod prelude;
pub mod report;
pub mod scan;

#[cfg(feature = "kinds")]
pub mod kinds;

// ============================================================================
// Explicit Re-exports
// ============================================================================

// Error types
pub use error::{IoResultExt, JanitorError, JanitorResult};

// Entities and needles
pub use entity::{
    combined_pattern, AnalyzedEntity, Attribution, EntityError, EntityIdentity, UsageMatrixCell,
    UsageSource,
};
pub use needle::{Needle, NeedleTarget};

// Analysis
pub use analyzer::{Analyzer, Candidate, EntityDiscovery};
pub use matcher::UsageMatcher;
pub use scan::{
    Corpus, CorpusFile, FileMatch, ScanOptions, ScanOutcome, Scanner, SkippedFile,
    DEFAULT_MAX_FILE_SIZE, EXCLUDED_DIRS,
};

// Configuration
pub use config::{load_config, JanitorConfig, OutputConfig, PathsConfig};

// Logging
pub use logging::init_structured_logging;

// Reporting
pub use report::{print_json, print_plain, AnalysisReport, EntityReport, ReportStats, UsageVerdict};

#[cfg(feature = "kinds")]
pub use kinds::{Assets, Routes, Views};

#[cfg(test)]
mod tests;
