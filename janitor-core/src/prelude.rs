//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use janitor_core::prelude::*;
//! ```

// Errors
pub use crate::error::{JanitorError, JanitorResult};

// Entity contract
pub use crate::entity::{AnalyzedEntity, EntityIdentity, UsageSource};
pub use crate::needle::{Needle, NeedleTarget};

// Analysis
pub use crate::analyzer::{Analyzer, Candidate, EntityDiscovery};
pub use crate::scan::ScanOptions;

// Reporting
pub use crate::report::{AnalysisReport, EntityReport, UsageVerdict};

// Configuration
pub use crate::config::{load_config, JanitorConfig};

// Built-in entity types
#[cfg(feature = "kinds")]
pub use crate::kinds::{Assets, Routes, Views};
