//! Usage needles: named pattern groups and the confidence they carry.
//!
//! A needle is matched either against file contents (the default) or
//! against the file's path relative to the scan root.

use serde::{Deserialize, Serialize};

use crate::error::{JanitorError, JanitorResult};

/// Which part of a file a needle is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeedleTarget {
    /// File contents
    #[default]
    Contents,
    /// Path relative to the root, `/`-separated
    Path,
}

/// A named group of regex fragments plus the usage weight they carry.
///
/// Immutable after construction: hooks that want to extend a needle use
/// [`Needle::with_pattern`], which returns a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Needle {
    name: String,
    patterns: Vec<String>,
    weight: i64,
    target: NeedleTarget,
}

impl Needle {
    /// Create a contents needle.
    ///
    /// Fails with `InvalidNeedle` if `patterns` is empty or any fragment is
    /// blank. Duplicate fragments are collapsed, keeping the first.
    pub fn new<I, S>(name: impl Into<String>, patterns: I, weight: i64) -> JanitorResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut unique: Vec<String> = Vec::new();

        for pattern in patterns {
            let pattern = pattern.into();
            if pattern.trim().is_empty() {
                return Err(JanitorError::invalid_needle(name, "blank pattern fragment"));
            }
            if !unique.contains(&pattern) {
                unique.push(pattern);
            }
        }

        if unique.is_empty() {
            return Err(JanitorError::invalid_needle(name, "needle has no patterns"));
        }

        Ok(Self {
            name,
            patterns: unique,
            weight,
            target: NeedleTarget::Contents,
        })
    }

    /// Create a needle matching `text` literally.
    pub fn literal(name: impl Into<String>, text: &str, weight: i64) -> JanitorResult<Self> {
        Self::new(name, [regex::escape(text)], weight)
    }

    /// Set the corpus this needle is matched against.
    pub fn targeting(mut self, target: NeedleTarget) -> Self {
        self.target = target;
        self
    }

    /// Return a copy of this needle with one more fragment appended.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> JanitorResult<Self> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(JanitorError::invalid_needle(&self.name, "blank pattern fragment"));
        }
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }

    pub fn target(&self) -> NeedleTarget {
        self.target
    }

    /// Alternation of this needle's own fragments.
    pub fn alternation(&self) -> String {
        self.patterns.join("|")
    }
}
