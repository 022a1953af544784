//! Named routes declared in PHP route files.
//!
//! Route names are read from `->name('x')` and `'as' => 'x'`
//! declarations. A route counts as used when something generates a URL
//! for it by name.
//!
//! Route files that cannot be read are skipped with a warning; invalid
//! UTF-8 is decoded lossily.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use super::{files_with_suffix, quoted};
use crate::analyzer::{Candidate, EntityDiscovery};
use crate::entity::{EntityIdentity, UsageSource};
use crate::error::JanitorResult;
use crate::needle::Needle;

/// Pre-compiled route name declaration patterns.
fn declaration_regexes() -> &'static [Regex; 2] {
    static REGEXES: OnceLock<[Regex; 2]> = OnceLock::new();
    // SAFETY: hardcoded patterns, exercised by the tests below.
    REGEXES.get_or_init(|| {
        [
            Regex::new(r#"->name\(\s*['"]([^'"]+)['"]\s*\)"#)
                .expect("Hardcoded regex pattern is valid"),
            Regex::new(r#"['"]as['"]\s*=>\s*['"]([^'"]+)['"]"#)
                .expect("Hardcoded regex pattern is valid"),
        ]
    })
}

/// Extract declared route names, in source order.
pub fn extract_route_names(content: &str) -> Vec<String> {
    let mut found: Vec<(usize, String)> = declaration_regexes()
        .iter()
        .flat_map(|re| re.captures_iter(content))
        .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str().to_string())))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, name)| name).collect()
}

/// Route entity type.
#[derive(Debug, Clone)]
pub struct Routes {
    /// Directory holding route files, relative to the root
    pub routes_dir: PathBuf,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            routes_dir: PathBuf::from("routes"),
        }
    }
}

impl Routes {
    pub fn new(routes_dir: impl Into<PathBuf>) -> Self {
        Self {
            routes_dir: routes_dir.into(),
        }
    }
}

impl EntityDiscovery for Routes {
    fn discover(&self, root: &Path) -> JanitorResult<Vec<Candidate>> {
        let mut candidates = Vec::new();
        for file in files_with_suffix(&root.join(&self.routes_dir), &[".php"])? {
            let bytes = match fs::read(&file) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %file.display(), error = %err, "skipping unreadable route file");
                    continue;
                }
            };
            let content = String::from_utf8_lossy(&bytes);
            candidates.extend(
                extract_route_names(&content)
                    .into_iter()
                    .map(|name| Candidate::new(name).with_definition(&file)),
            );
        }
        Ok(candidates)
    }
}

impl UsageSource for Routes {
    fn kind(&self) -> &'static str {
        "route"
    }

    fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
        let name = quoted(&entity.name);
        Ok(vec![
            Needle::new(
                "route-helper",
                [format!(r"(?:^|[^>:\w])route\(\s*{}", name)],
                10,
            )?,
            Needle::new(
                "redirect-route",
                [
                    format!(r"->route\(\s*{}", name),
                    format!(r"(?:URL|Redirect)::route\(\s*{}", name),
                ],
                10,
            )?,
            Needle::new("name-literal", [name], 1)?,
        ])
    }
}
