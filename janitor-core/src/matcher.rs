//! Compiled form of a usage matrix.
//!
//! The combined alternation is tried first as a cheap rejection test; only
//! files it matches are run through the per-needle [`RegexSet`]s, which
//! report every needle that fired in a single pass.

use regex::{Regex, RegexSet};

use crate::entity::combined_pattern;
use crate::error::{JanitorError, JanitorResult};
use crate::needle::{Needle, NeedleTarget};

/// Matcher for one entity's usage matrix.
#[derive(Debug, Clone)]
pub struct UsageMatcher {
    combined: Option<Regex>,
    contents: RegexSet,
    contents_index: Vec<usize>,
    paths: RegexSet,
    paths_index: Vec<usize>,
}

fn compile_set<'a>(
    needles: impl Iterator<Item = (usize, &'a Needle)>,
) -> JanitorResult<(RegexSet, Vec<usize>)> {
    let (index, alternations): (Vec<usize>, Vec<String>) = needles
        .map(|(idx, needle)| (idx, format!("(?:{})", needle.alternation())))
        .unzip();

    let set = RegexSet::new(&alternations).map_err(|e| {
        JanitorError::invalid_pattern(alternations.join("|"), e.to_string())
    })?;
    Ok((set, index))
}

impl UsageMatcher {
    /// Compile a matrix. Fails with `InvalidPattern` if any fragment is not
    /// a valid regular expression.
    pub fn compile(matrix: &[Needle]) -> JanitorResult<Self> {
        let combined = if matrix.is_empty() {
            None
        } else {
            let pattern = combined_pattern(matrix);
            Some(
                Regex::new(&pattern)
                    .map_err(|e| JanitorError::invalid_pattern(&pattern, e.to_string()))?,
            )
        };

        let (contents, contents_index) = compile_set(
            matrix
                .iter()
                .enumerate()
                .filter(|(_, n)| n.target() == NeedleTarget::Contents),
        )?;
        let (paths, paths_index) = compile_set(
            matrix
                .iter()
                .enumerate()
                .filter(|(_, n)| n.target() == NeedleTarget::Path),
        )?;

        Ok(Self {
            combined,
            contents,
            contents_index,
            paths,
            paths_index,
        })
    }

    /// Indices (matrix order, ascending) of every needle matching this file.
    pub fn matching_needles(&self, contents: &str, relative_path: &str) -> Vec<usize> {
        let Some(combined) = &self.combined else {
            return Vec::new();
        };
        if !combined.is_match(contents) && !combined.is_match(relative_path) {
            return Vec::new();
        }

        let mut hits: Vec<usize> = self
            .contents
            .matches(contents)
            .iter()
            .map(|i| self.contents_index[i])
            .chain(
                self.paths
                    .matches(relative_path)
                    .iter()
                    .map(|i| self.paths_index[i]),
            )
            .collect();
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_every_matching_needle() {
        let matrix = vec![
            Needle::new("helper", [r"route\('home'\)"], 10).unwrap(),
            Needle::new("literal", ["'home'"], 1).unwrap(),
            Needle::new("other", ["nothing-here"], 5).unwrap(),
        ];
        let matcher = UsageMatcher::compile(&matrix).unwrap();

        assert_eq!(matcher.matching_needles("route('home')", "a.php"), vec![0, 1]);
        assert!(matcher.matching_needles("route('about')", "a.php").is_empty());
    }

    #[test]
    fn test_path_needles_ignore_contents() {
        let matrix = vec![Needle::new("by-path", [r"^css/app\.css$"], 2)
            .unwrap()
            .targeting(NeedleTarget::Path)];
        let matcher = UsageMatcher::compile(&matrix).unwrap();

        assert_eq!(matcher.matching_needles("", "css/app.css"), vec![0]);
        assert!(matcher.matching_needles("css/app.css", "index.html").is_empty());
    }

    #[test]
    fn test_invalid_fragment() {
        let matrix = vec![Needle::new("broken", ["render("], 1).unwrap()];
        let err = UsageMatcher::compile(&matrix).unwrap_err();
        assert_eq!(err.kind(), "invalid_pattern");
    }

    #[test]
    fn test_empty_matrix_matches_nothing() {
        let matcher = UsageMatcher::compile(&[]).unwrap();
        assert!(matcher.matching_needles("anything", "any/path").is_empty());
    }
}
