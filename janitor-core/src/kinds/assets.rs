//! Static assets served from the public directory.

use std::path::{Path, PathBuf};

use super::files_with_suffix;
use crate::analyzer::{Candidate, EntityDiscovery};
use crate::entity::{EntityIdentity, UsageSource};
use crate::error::JanitorResult;
use crate::needle::Needle;
use crate::scan::relative_path;

const ASSET_SUFFIXES: &[&str] = &[
    ".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".woff", ".woff2",
    ".ttf", ".eot",
];

/// Asset entity type.
#[derive(Debug, Clone)]
pub struct Assets {
    /// Public directory, relative to the root
    pub assets_dir: PathBuf,
}

impl Default for Assets {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("public"),
        }
    }
}

impl Assets {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }
}

impl EntityDiscovery for Assets {
    fn discover(&self, root: &Path) -> JanitorResult<Vec<Candidate>> {
        let dir = root.join(&self.assets_dir);
        Ok(files_with_suffix(&dir, ASSET_SUFFIXES)?
            .into_iter()
            .map(|file| Candidate::new(relative_path(&dir, &file)).with_definition(file))
            .collect())
    }
}

impl UsageSource for Assets {
    fn kind(&self) -> &'static str {
        "asset"
    }

    /// Full public path is strong evidence; a bare filename can collide
    /// with same-named files in other directories.
    fn compute_usage_matrix(&self, entity: &EntityIdentity) -> JanitorResult<Vec<Needle>> {
        let mut matrix = vec![Needle::literal("asset-path", &entity.name, 10)?];
        if let Some((_, filename)) = entity.name.rsplit_once('/') {
            matrix.push(Needle::literal("asset-filename", filename, 3)?);
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> EntityIdentity {
        EntityIdentity {
            root: PathBuf::from("/app"),
            name: name.into(),
            definition: None,
        }
    }

    #[test]
    fn test_nested_asset_has_filename_needle() {
        let matrix = Assets::default()
            .compute_usage_matrix(&identity("img/logo.png"))
            .unwrap();
        let names: Vec<&str> = matrix.iter().map(|n| n.name()).collect();
        assert_eq!(names, ["asset-path", "asset-filename"]);
        assert_eq!(matrix[1].patterns(), [r"logo\.png"]);
    }

    #[test]
    fn test_top_level_asset() {
        let matrix = Assets::default()
            .compute_usage_matrix(&identity("favicon.ico"))
            .unwrap();
        assert_eq!(matrix.len(), 1);
    }
}
