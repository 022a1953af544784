//! Template views, named by their dotted path under the views directory.
//!
//! `resources/views/emails/welcome.blade.php` is the view `emails.welcome`.
//! Templates may be referenced in dotted or slashed form, so the needle
//! hook adds the slashed spelling to the `view-reference` needle.

use std::path::{Path, PathBuf};

use super::{files_with_suffix, quoted};
use crate::analyzer::{Candidate, EntityDiscovery};
use crate::entity::{EntityIdentity, UsageSource};
use crate::error::JanitorResult;
use crate::needle::Needle;
use crate::scan::relative_path;

/// Recognized template suffixes, longest first so `.blade.php` wins over `.php`.
const TEMPLATE_SUFFIXES: &[&str] = &[".blade.php", ".html.twig", ".twig", ".php"];

/// Dotted view name for a template path relative to the views directory.
pub fn view_name(relative: &str) -> String {
    let stem = TEMPLATE_SUFFIXES
        .iter()
        .find_map(|suffix| relative.strip_suffix(suffix))
        .unwrap_or(relative);
    stem.replace('/', ".")
}

/// View entity type.
#[derive(Debug, Clone)]
pub struct Views {
    /// Views directory, relative to the root
    pub views_dir: PathBuf,
}

impl Default for Views {
    fn default() -> Self {
        Self {
            views_dir: PathBuf::from("resources/views"),
        }
    }
}

impl Views {
    pub fn new(views_dir: impl Into<PathBuf>) -> Self {
        Self {
            views_dir: views_dir.into(),
        }
    }
}

impl EntityDiscovery for Views {
    fn discover(&self, root: &Path) -> JanitorResult<Vec<Candidate>> {
        let dir = root.join(&self.views_dir);
        Ok(files_with_suffix(&dir, TEMPLATE_SUFFIXES)?
            .into_iter()
            .map(|file| {
                let name = view_name(&relative_path(&dir, &file));
                Candidate::new(name).with_definition(file)
            })
            .collect())
    }
}

impl UsageSource for Views {
    fn kind(&self) -> &'static str {
        "view"
    }

    fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
        let name = quoted(&entity.name);
        Ok(vec![
            Needle::new("view-reference", [name.clone()], 10)?,
            Needle::new(
                "blade-directive",
                [format!(r"@(?:include|includeIf|extends|component|each)\(\s*{}", name)],
                5,
            )?,
        ])
    }

    fn process_usage_needle(
        &self,
        entity: &EntityIdentity,
        needle: Needle,
    ) -> JanitorResult<Needle> {
        if needle.name() != "view-reference" || !entity.name.contains('.') {
            return Ok(needle);
        }
        needle.with_pattern(quoted(&entity.name.replace('.', "/")))
    }
}
